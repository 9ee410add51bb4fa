//! Message router
//!
//! Turns inbound text frames into typed [`DomainEvent`]s and, where the event
//! warrants it, notification content for the sink. Dispatch is table driven:
//! each frame type maps to one [`FrameHandler`], so adding an event type is a
//! single [`MessageRouter::register`] call.
//!
//! The router never fails. Malformed input is logged and dropped; unknown
//! frame types are ignored.

pub mod handlers;

use std::collections::HashMap;

use crate::error::RouteError;
use crate::protocol::{types, DomainEvent, Frame};
use crate::types::NewNotification;

/// Output of a frame handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    /// Decoded event
    pub event: DomainEvent,
    /// Notification to raise, if any
    pub notification: Option<NewNotification>,
}

/// A routed event together with the topic it arrived on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    /// Topic (room) the server published on, if any
    pub topic: Option<String>,
    /// Decoded event
    pub event: DomainEvent,
    /// Notification content raised for the event
    pub notification: Option<NewNotification>,
}

/// Decoder for one frame type
pub type FrameHandler = fn(&Frame) -> Result<Routed, RouteError>;

/// Table-driven inbound frame dispatcher
pub struct MessageRouter {
    handlers: HashMap<&'static str, FrameHandler>,
}

impl MessageRouter {
    /// Router with the built-in domain event handlers registered
    pub fn new() -> Self {
        let mut router = Self::empty();
        router
            .register(types::MESSAGE_CREATED, handlers::message_created)
            .register(types::CONVERSATION_CREATED, handlers::conversation_created)
            .register(types::CONVERSATION_UPDATED, handlers::conversation_updated);
        router
    }

    /// Router with no handlers
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register (or replace) the handler for a frame type
    pub fn register(&mut self, frame_type: &'static str, handler: FrameHandler) -> &mut Self {
        self.handlers.insert(frame_type, handler);
        self
    }

    /// Whether a handler exists for `frame_type`
    pub fn handles(&self, frame_type: &str) -> bool {
        self.handlers.contains_key(frame_type)
    }

    /// Decode one inbound text frame
    ///
    /// Returns `None` for malformed frames and for types without a handler.
    pub fn route(&self, raw: &str) -> Option<RoutedEvent> {
        let frame = match Frame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed frame");
                return None;
            }
        };

        let Some(handler) = self.handlers.get(frame.frame_type.as_str()) else {
            tracing::debug!(frame_type = %frame.frame_type, "ignoring unknown frame type");
            return None;
        };

        match handler(&frame) {
            Ok(routed) => Some(RoutedEvent {
                topic: frame.topic,
                event: routed.event,
                notification: routed.notification,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "discarding frame with malformed payload");
                None
            }
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}
