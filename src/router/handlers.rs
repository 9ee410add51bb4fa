//! Built-in handlers for server-pushed domain events

use serde::de::DeserializeOwned;

use super::Routed;
use crate::error::RouteError;
use crate::protocol::{ConversationCreated, ConversationUpdated, DomainEvent, Frame, MessageCreated};
use crate::types::{NewNotification, NotificationCategory};

/// Longest message preview shown in a notification body, in characters
pub const PREVIEW_CHARS: usize = 100;

/// Notification copy (pt-BR, matching the console UI)
pub mod text {
    pub const MESSAGE_TITLE: &str = "Nova mensagem";
    pub const MESSAGE_FALLBACK_BODY: &str = "Nova mensagem recebida";
    pub const CONVERSATION_CREATED_TITLE: &str = "Nova conversa";
    pub const CONVERSATION_CREATED_BODY: &str = "Uma nova conversa foi iniciada";
    pub const CONVERSATION_UPDATED_TITLE: &str = "Conversa atualizada";
    pub const CONVERSATION_UPDATED_BODY: &str = "Uma conversa foi reaberta ou respondida";
}

fn decode<T: DeserializeOwned>(frame: &Frame) -> Result<T, RouteError> {
    T::deserialize(&frame.payload).map_err(|source| RouteError::Payload {
        frame_type: frame.frame_type.clone(),
        source,
    })
}

/// First [`PREVIEW_CHARS`] characters of `content`, or the fallback when empty
pub fn preview(content: Option<&str>) -> String {
    match content {
        Some(c) if !c.is_empty() => c.chars().take(PREVIEW_CHARS).collect(),
        _ => text::MESSAGE_FALLBACK_BODY.to_string(),
    }
}

/// `message.created` → message notification with a content preview
pub fn message_created(frame: &Frame) -> Result<Routed, RouteError> {
    let event: MessageCreated = decode(frame)?;
    let notification = NewNotification::new(
        NotificationCategory::Message,
        text::MESSAGE_TITLE,
        preview(event.content.as_deref()),
    )
    .with_conversation(event.conversation_id.clone());

    Ok(Routed {
        event: DomainEvent::MessageCreated(event),
        notification: Some(notification),
    })
}

/// `conversation.created` → conversation notification
pub fn conversation_created(frame: &Frame) -> Result<Routed, RouteError> {
    let event: ConversationCreated = decode(frame)?;
    let notification = NewNotification::new(
        NotificationCategory::Conversation,
        text::CONVERSATION_CREATED_TITLE,
        text::CONVERSATION_CREATED_BODY,
    )
    .with_conversation(event.id.clone());

    Ok(Routed {
        event: DomainEvent::ConversationCreated(event),
        notification: Some(notification),
    })
}

/// `conversation.updated` → notification only when the status is `open`
pub fn conversation_updated(frame: &Frame) -> Result<Routed, RouteError> {
    let event: ConversationUpdated = decode(frame)?;
    let notification = event.is_open().then(|| {
        NewNotification::new(
            NotificationCategory::Conversation,
            text::CONVERSATION_UPDATED_TITLE,
            text::CONVERSATION_UPDATED_BODY,
        )
        .with_conversation(event.id.clone())
    });

    Ok(Routed {
        event: DomainEvent::ConversationUpdated(event),
        notification,
    })
}
