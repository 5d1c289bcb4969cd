//! Conversation Data Structures
//!
//! A conversation is the unique context between exactly two users. The
//! unordered pair is normalized into [`ParticipantPair`] so that `(A, B)` and
//! `(B, A)` always produce the same key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{ConversationId, Message, MessageView};
use crate::shared::error::SharedError;

/// Normalized unordered pair of distinct users (`low < high`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: Uuid,
    high: Uuid,
}

impl ParticipantPair {
    /// Normalize two user ids into a pair; a user cannot pair with themselves
    pub fn new(a: Uuid, b: Uuid) -> Result<Self, SharedError> {
        if a == b {
            return Err(SharedError::validation(
                "receiver_id",
                "Cannot start a conversation with yourself",
            ));
        }
        Ok(if a < b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        })
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is one of the two
    pub fn other(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

/// A stored two-party conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: ParticipantPair,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(user_id)
    }

    /// Get the other participant
    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        self.participants.other(user_id)
    }

    /// Timestamp used to order conversation lists
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

/// Store-level listing row: a conversation with its latest message and the
/// unread count for the listing user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

/// One page of a conversation's history, chronological inside the page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total: i64,
}

/// Conversation list item returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub other_participant_id: Uuid,
    pub other_participant_name: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message: Option<MessageView>,
    pub unread_count: i64,
}

/// Conversation metadata plus one page of messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationDetail {
    pub id: ConversationId,
    pub other_participant_id: Uuid,
    pub other_participant_name: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub messages: Vec<MessageView>,
    pub total_messages: i64,
    pub current_page: u32,
    pub page_size: u32,
}
