//! In-memory message store
//!
//! Used when no database is configured and throughout the test suite. All
//! state sits behind one `tokio::sync::RwLock`, so every trait method is
//! atomic, including the uniqueness check in `create_conversation`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{page_offset, timestamp_now, MessageStore, StoreError};
use crate::shared::messaging::{
    Conversation, ConversationEntry, ConversationId, Message, MessageId, MessagePage,
    ParticipantPair,
};

#[derive(Debug, Default)]
struct Inner {
    last_conversation_id: ConversationId,
    last_message_id: MessageId,
    conversations: HashMap<ConversationId, Conversation>,
    by_pair: HashMap<ParticipantPair, ConversationId>,
    messages: Vec<Message>,
}

impl Inner {
    fn messages_of(&self, conversation_id: ConversationId) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(move |m| m.conversation_id == conversation_id)
    }
}

/// Process-local [`MessageStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations
    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.conversations.len()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn find_conversation_between(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Conversation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_pair
            .get(&pair)
            .and_then(|id| inner.conversations.get(id))
            .cloned())
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn create_conversation(&self, pair: ParticipantPair) -> Result<Conversation, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_pair.contains_key(&pair) {
            return Err(StoreError::Conflict);
        }

        inner.last_conversation_id += 1;
        let conversation = Conversation {
            id: inner.last_conversation_id,
            participants: pair,
            created_at: timestamp_now(),
            last_message_at: None,
        };
        inner.by_pair.insert(pair, conversation.id);
        inner.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut inner = self.inner.write().await;
        let participants = inner
            .conversations
            .get(&conversation_id)
            .map(|c| c.participants)
            .ok_or_else(|| StoreError::not_found("Conversation"))?;
        if participants.other(sender_id) != Some(receiver_id) {
            return Err(StoreError::invalid(
                "sender and receiver must be the conversation's participants",
            ));
        }

        inner.last_message_id += 1;
        let message = Message {
            id: inner.last_message_id,
            conversation_id,
            sender_id,
            receiver_id,
            content: content.to_string(),
            sent_at: timestamp_now(),
            read_at: None,
            is_read: false,
        };
        inner.messages.push(message.clone());
        if let Some(conversation) = inner.conversations.get_mut(&conversation_id) {
            conversation.last_message_at = Some(message.sent_at);
        }
        Ok(message)
    }

    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<ConversationEntry> = inner
            .conversations
            .values()
            .filter(|c| c.has_participant(user_id))
            .map(|c| {
                let last_message = inner
                    .messages_of(c.id)
                    .max_by_key(|m| m.order_key())
                    .cloned();
                let unread_count = inner
                    .messages_of(c.id)
                    .filter(|m| m.receiver_id == user_id && !m.is_read)
                    .count() as i64;
                ConversationEntry {
                    conversation: c.clone(),
                    last_message,
                    unread_count,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            (b.conversation.activity_at(), b.conversation.id)
                .cmp(&(a.conversation.activity_at(), a.conversation.id))
        });
        Ok(entries)
    }

    async fn list_messages_page(
        &self,
        conversation_id: ConversationId,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, StoreError> {
        let inner = self.inner.read().await;
        let mut newest_first: Vec<&Message> = inner.messages_of(conversation_id).collect();
        newest_first.sort_by_key(|m| std::cmp::Reverse(m.order_key()));

        let total = newest_first.len() as i64;
        let offset = usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX);
        let mut messages: Vec<Message> = newest_first
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect();
        messages.reverse();

        Ok(MessagePage { messages, total })
    }

    async fn mark_read_for_user(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let now = timestamp_now();
        let mut changed = 0;
        for message in inner
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.receiver_id == user_id && !m.is_read)
        {
            message.is_read = true;
            message.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_unread_for_user(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.receiver_id == user_id && !m.is_read)
            .count() as i64)
    }
}
