//! Seams between the channel and the outside world
//!
//! The channel owns the only transport handle and talks to it through
//! [`Transport`]. Opening connections and scheduling reconnects are behind
//! [`Connector`] and [`Timer`] so the state machine can be driven by a real
//! socket and tokio timers, or by in-memory fakes in tests.

use std::time::Duration;

use super::state::{ConnectionId, TimerId};
use crate::error::TransportError;

/// A live (or establishing) bidirectional connection
pub trait Transport: Send {
    /// Queue a text frame. Must not block.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection. Safe to call more than once.
    fn close(&mut self);
}

/// Factory for transports
///
/// `open` starts the connection and returns immediately; lifecycle callbacks
/// are later delivered to the channel as
/// [`ChannelEvent`](super::ChannelEvent)s tagged with `id`.
pub trait Connector: Send {
    fn open(&mut self, url: &str, id: ConnectionId) -> Box<dyn Transport>;
}

/// One-shot timer service used for reconnect delays
pub trait Timer: Send {
    /// Deliver `RetryFired(id)` after `delay`
    fn schedule(&mut self, id: TimerId, delay: Duration);

    /// Prevent `id` from firing. Unknown ids are ignored.
    fn cancel(&mut self, id: TimerId);
}
