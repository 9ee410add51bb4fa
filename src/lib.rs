//! Inbox Realtime
//!
//! The live-update client of the customer-messaging console: a single
//! authenticated WebSocket connection that survives network drops and session
//! changes, and turns server events into notifications and typed events.
//!
//! # Features
//!
//! - **Reconnecting channel**: fixed-delay reconnect for as long as the user is
//!   logged in; logout tears everything down immediately
//! - **Subscription replay**: topics are held in a registry and re-sent after
//!   every reconnect, personal feed first
//! - **Table-driven routing**: each server event type maps to one handler
//! - **Bounded notifications**: newest 50 kept, unread count always exact
//!
//! # Modules
//!
//! - `channel`: connection state machine and its transport/timer seams
//! - `router`: inbound frame decoding and dispatch
//! - `registry`: held topics
//! - `sink`: notification buffer and alerters
//! - `session`: session provider contract and in-memory store
//! - `protocol`: wire envelope and event payloads
//! - `runtime`: tokio + tokio-tungstenite driver
//! - `testing`: in-memory connector and manual timer
//! - `config`, `error`, `types`, `utils`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use inbox_realtime::{ClientConfig, LiveClient, NotificationSink, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> inbox_realtime::ClientResult<()> {
//!     let session = Arc::new(SessionStore::new());
//!     session.login("bearer-token");
//!
//!     let client = LiveClient::spawn(
//!         &ClientConfig::from_env()?,
//!         session,
//!         NotificationSink::default().shared(),
//!     )?;
//!     client.subscribe("conv-42")?;
//!
//!     let mut events = client.events();
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event.event);
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod runtime;
pub mod session;
pub mod sink;
pub mod testing;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use channel::{ChannelEvent, ConnectionState, EventChannel};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ConfigError};
pub use protocol::{DomainEvent, Frame};
pub use registry::SubscriptionRegistry;
pub use router::{MessageRouter, RoutedEvent};
pub use runtime::LiveClient;
pub use session::{SessionProvider, SessionState, SessionStore};
pub use sink::{NotificationSink, SharedSink};
pub use types::{NewNotification, Notification, NotificationCategory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
