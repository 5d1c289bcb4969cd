//! Conversation/Message Store
//!
//! The durable, append-only log of messages grouped into two-party
//! conversations. Two implementations exist: [`super::db::SqlStore`] over
//! SQLite and [`super::memory::MemoryStore`] for single-process runs and tests.
//!
//! Pair uniqueness is owned here: `create_conversation` reports
//! [`StoreError::Conflict`] when the pair already has a row, and
//! [`MessageStore::find_or_create_conversation`] turns that into a re-read so
//! callers never observe two ids for one pair.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::messaging::{
    Conversation, ConversationEntry, ConversationId, Message, MessagePage, ParticipantPair,
};

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The normalized pair already has a conversation
    #[error("conversation already exists for this pair")]
    Conflict,

    #[error("{what} not found")]
    NotFound { what: &'static str },

    /// A write that would break a store invariant (e.g. a message whose
    /// sender/receiver are not the conversation's participants)
    #[error("invalid write: {message}")]
    Invalid { message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Storage contract for conversations and messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Order-independent lookup of the pair's conversation
    async fn find_conversation_between(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Conversation>, StoreError>;

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Create the pair's conversation; `Conflict` if one already exists
    async fn create_conversation(&self, pair: ParticipantPair) -> Result<Conversation, StoreError>;

    /// Append a message and bump the conversation's `last_message_at` as one unit
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Conversations involving `user_id`, most recently active first
    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationEntry>, StoreError>;

    /// The `page`-th most recent window (1-based), chronological inside the page
    async fn list_messages_page(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, StoreError>;

    /// Mark every unread message addressed to `user_id` as read; returns how
    /// many messages changed
    async fn mark_read_for_user(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
    ) -> Result<u64, StoreError>;

    async fn count_unread_for_user(&self, user_id: Uuid) -> Result<i64, StoreError>;

    /// Find the pair's conversation, creating it if absent
    async fn find_or_create_conversation(
        &self,
        pair: ParticipantPair,
    ) -> Result<Conversation, StoreError> {
        if let Some(existing) = self.find_conversation_between(pair).await? {
            return Ok(existing);
        }

        match self.create_conversation(pair).await {
            Ok(created) => {
                tracing::debug!(
                    "[Store] Created conversation {} for {} / {}",
                    created.id,
                    pair.low(),
                    pair.high()
                );
                Ok(created)
            }
            Err(StoreError::Conflict) => {
                tracing::debug!(
                    "[Store] Lost creation race for {} / {}, re-reading",
                    pair.low(),
                    pair.high()
                );
                self.find_conversation_between(pair)
                    .await?
                    .ok_or_else(|| StoreError::not_found("Conversation"))
            }
            Err(err) => Err(err),
        }
    }
}

/// Current time at the precision both stores persist (microseconds)
pub(crate) fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Offset of a 1-based page, saturating instead of overflowing
pub(crate) fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(page_size)
}
