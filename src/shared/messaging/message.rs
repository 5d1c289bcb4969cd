//! Message Data Structures
//!
//! A stored [`Message`] plus the display-enriched [`MessageView`] handed to
//! REST callers and realtime subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Conversation identifier (store-assigned, monotonically increasing)
pub type ConversationId = i64;

/// Message identifier; the tie-break for messages sharing a `sent_at`
pub type MessageId = i64;

/// A persisted direct message
///
/// `content`, `sent_at`, `sender_id` and `receiver_id` never change after
/// creation. `is_read`/`read_at` only move forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub is_read: bool,
}

impl Message {
    /// Ordering key within a conversation
    pub fn order_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.sent_at, self.id)
    }
}

/// Message as presented to clients, with participant display names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: Uuid,
    #[serde(default)]
    pub sender_name: String,
    pub receiver_id: Uuid,
    #[serde(default)]
    pub receiver_name: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub is_read: bool,
}

impl MessageView {
    /// View without display names (used inside conversation listings)
    pub fn bare(message: Message) -> Self {
        Self::named(message, String::new(), String::new())
    }

    pub fn named(message: Message, sender_name: String, receiver_name: String) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender_name,
            receiver_id: message.receiver_id,
            receiver_name,
            content: message.content,
            sent_at: message.sent_at,
            read_at: message.read_at,
            is_read: message.is_read,
        }
    }
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}

/// Check message content against the configured length bound
///
/// Content consisting only of whitespace counts as empty. Length is measured
/// in characters, not bytes.
pub fn validate_content(content: &str, max_len: usize) -> Result<(), SharedError> {
    if content.trim().is_empty() {
        return Err(SharedError::validation("content", "Message content is required"));
    }
    if content.chars().count() > max_len {
        return Err(SharedError::validation(
            "content",
            format!("Message content cannot exceed {} characters", max_len),
        ));
    }
    Ok(())
}
