//! Notification types shown in the console's alert dropdown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of event a notification was raised for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// A new message arrived in a conversation
    Message,
    /// A conversation was created or reopened
    Conversation,
    /// Client-side or system notice
    System,
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationCategory::Message => write!(f, "message"),
            NotificationCategory::Conversation => write!(f, "conversation"),
            NotificationCategory::System => write!(f, "system"),
        }
    }
}

/// Notification content before the sink assigns identity and read state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl NewNotification {
    /// Create notification content without a related conversation
    pub fn new(category: NotificationCategory, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            body: body.into(),
            conversation_id: None,
        }
    }

    /// Attach the related conversation
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// A user-facing alert held by the [`NotificationSink`](crate::sink::NotificationSink)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Materialise new content as an unread notification created at `created_at`
    pub fn from_new(content: NewNotification, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            category: content.category,
            title: content.title,
            body: content.body,
            conversation_id: content.conversation_id,
            read: false,
            created_at,
        }
    }

    /// Console route of the related conversation, if any
    pub fn link(&self) -> Option<String> {
        self.conversation_id
            .as_ref()
            .map(|id| format!("/conversations/{}", id))
    }
}
