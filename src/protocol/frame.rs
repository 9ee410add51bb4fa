//! Wire envelope exchanged over the persistent connection

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RouteError;

/// Known frame type tags
pub mod types {
    /// Client → server: start receiving a topic
    pub const SUBSCRIBE: &str = "subscribe";
    /// Client → server: stop receiving a topic
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    /// Server → client: a message was posted in a conversation
    pub const MESSAGE_CREATED: &str = "message.created";
    /// Server → client: a conversation was opened
    pub const CONVERSATION_CREATED: &str = "conversation.created";
    /// Server → client: a conversation changed status
    pub const CONVERSATION_UPDATED: &str = "conversation.updated";
}

/// Uniform frame envelope: `{ "type": ..., "payload": ..., "topic"?: ... }`
///
/// `type` is an open tag. The server names the topic field `room`; both
/// spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub frame_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, alias = "room", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Frame {
    /// Create a frame with an arbitrary type and payload
    pub fn new(frame_type: impl Into<String>, payload: Value) -> Self {
        Self {
            frame_type: frame_type.into(),
            payload,
            topic: None,
        }
    }

    /// `{"type":"subscribe","payload":<topic>}`
    pub fn subscribe(topic: &str) -> Self {
        Self::new(types::SUBSCRIBE, Value::String(topic.to_string()))
    }

    /// `{"type":"unsubscribe","payload":<topic>}`
    pub fn unsubscribe(topic: &str) -> Self {
        Self::new(types::UNSUBSCRIBE, Value::String(topic.to_string()))
    }

    /// Parse a text frame into the envelope
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        serde_json::from_str(raw).map_err(RouteError::Envelope)
    }

    /// Serialize to the wire text form
    pub fn to_text(&self) -> String {
        // A Frame is always representable as JSON
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Topic carried by a subscribe/unsubscribe frame
    pub fn payload_topic(&self) -> Option<&str> {
        self.payload.as_str()
    }
}
