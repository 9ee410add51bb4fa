//! Error types for the real-time client
//!
//! Only programmer errors reach callers. Operational faults (transport drops,
//! malformed frames, alert failures) are absorbed where they happen and turned
//! into state transitions or log lines.

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while building a [`ClientConfig`](crate::config::ClientConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The origin could not be parsed as an absolute URL.
    #[error("invalid origin {origin:?}: {reason}")]
    InvalidOrigin {
        /// The rejected origin string.
        origin: String,
        /// Parser message.
        reason: String,
    },

    /// The origin uses a scheme that has no WebSocket counterpart.
    #[error("unsupported origin scheme: {0}")]
    UnsupportedScheme(String),

    /// A numeric environment variable did not parse.
    #[error("invalid value for {name}: {value:?}")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Errors surfaced to callers of the client API
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A topic was empty or whitespace only.
    #[error("invalid topic: {0:?}")]
    InvalidTopic(String),

    /// The client task has already stopped.
    #[error("client has been shut down")]
    Shutdown,
}

/// Errors reported by a [`Transport`](crate::channel::Transport)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The underlying connection is gone.
    #[error("transport closed")]
    Closed,

    /// Any other I/O level failure.
    #[error("transport I/O error: {0}")]
    Io(String),
}

/// Errors from best-effort alert side effects
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The alert mechanism is not available on this host.
    #[error("alert unavailable: {0}")]
    Unavailable(String),

    /// Writing the alert failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding an inbound frame
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The text was not a valid frame envelope.
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The envelope parsed but its payload did not match the event shape.
    #[error("malformed {frame_type} payload: {source}")]
    Payload {
        /// Frame type whose payload failed.
        frame_type: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}
