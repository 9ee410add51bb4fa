//! Wire protocol for the real-time connection
//!
//! Frames are JSON text messages sharing one envelope. Outbound frames only
//! manage subscriptions; inbound frames carry domain events.

pub mod events;
mod frame;

pub use events::{ConversationCreated, ConversationUpdated, DomainEvent, MessageCreated};
pub use frame::{types, Frame};
