//! Connection state and the events that drive it

use std::fmt;

/// Lifecycle state of the single session connection
///
/// ```text
/// Idle → Connecting → Open → Closing → ClosedPendingRetry → Connecting → …
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No connection and none scheduled
    #[default]
    Idle,
    /// Transport handshake in progress
    Connecting,
    /// Frames can be sent
    Open,
    /// Peer started the close handshake
    Closing,
    /// Connection lost, reconnect timer running
    ClosedPendingRetry,
}

impl ConnectionState {
    /// Whether a transport is live or being established
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closing => write!(f, "closing"),
            ConnectionState::ClosedPendingRetry => write!(f, "closed_pending_retry"),
        }
    }
}

/// Identifies one transport instance opened by the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Identifies one scheduled reconnect timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Asynchronous inputs to the channel
///
/// Transport callbacks carry the [`ConnectionId`] they belong to and timer
/// firings carry their [`TimerId`]; the channel ignores any that no longer
/// match its current connection or pending timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Transport handshake completed
    Opened(ConnectionId),
    /// Text frame received
    Message(ConnectionId, String),
    /// Peer sent a close frame
    Closing(ConnectionId),
    /// Transport closed
    Closed(ConnectionId),
    /// Transport failed
    Errored(ConnectionId, String),
    /// Reconnect timer elapsed
    RetryFired(TimerId),
    /// Session token or authentication flag changed
    SessionChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }

    #[test]
    fn test_is_active() {
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Open.is_active());
        assert!(!ConnectionState::Closing.is_active());
        assert!(!ConnectionState::ClosedPendingRetry.is_active());
        assert!(!ConnectionState::Idle.is_active());
    }
}
