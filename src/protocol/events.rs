//! Typed payloads of server-pushed domain events

use serde::{Deserialize, Serialize};

/// Conversation status that raises a notification on update
pub const STATUS_OPEN: &str = "open";

/// `message.created` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCreated {
    #[serde(default)]
    pub content: Option<String>,
    pub conversation_id: String,
}

/// `conversation.created` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationCreated {
    pub id: String,
}

/// `conversation.updated` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationUpdated {
    pub id: String,
    pub status: String,
}

impl ConversationUpdated {
    /// Whether the conversation was (re)opened
    pub fn is_open(&self) -> bool {
        self.status == STATUS_OPEN
    }
}

/// A decoded server event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    MessageCreated(MessageCreated),
    ConversationCreated(ConversationCreated),
    ConversationUpdated(ConversationUpdated),
}

impl DomainEvent {
    /// Conversation the event belongs to
    pub fn conversation_id(&self) -> &str {
        match self {
            DomainEvent::MessageCreated(e) => &e.conversation_id,
            DomainEvent::ConversationCreated(e) => &e.id,
            DomainEvent::ConversationUpdated(e) => &e.id,
        }
    }
}
