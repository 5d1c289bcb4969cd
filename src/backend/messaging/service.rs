/**
 * Messaging Service
 *
 * Orchestrates every messaging operation. Both the REST handlers and the
 * realtime gateway call into this type; it is the only place that talks to
 * both the message store and the identity directory.
 *
 * # Authorization
 *
 * Conversation reads and read-marking require the caller to be one of the
 * conversation's two participants. A missing conversation is `NotFound`; a
 * present one the caller is not part of is `Forbidden`.
 */

use std::sync::Arc;

use uuid::Uuid;

use super::store::MessageStore;
use crate::backend::auth::identity::IdentityProvider;
use crate::backend::error::BackendError;
use crate::shared::config::{AppConfig, DEFAULT_MAX_MESSAGE_LENGTH, DEFAULT_MIN_PAGE_SIZE};
use crate::shared::messaging::{
    validate_content, Conversation, ConversationDetail, ConversationId, ConversationSummary,
    MessageView, ParticipantPair,
};

#[derive(Clone)]
pub struct MessagingService {
    store: Arc<dyn MessageStore>,
    identity: Arc<dyn IdentityProvider>,
    max_message_length: usize,
    min_page_size: u32,
}

impl MessagingService {
    pub fn new(store: Arc<dyn MessageStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            min_page_size: DEFAULT_MIN_PAGE_SIZE,
        }
    }

    /// Apply the limits from `config`
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.max_message_length = config.max_message_length;
        self.min_page_size = config.min_page_size;
        self
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Send `content` from `sender_id` to `receiver_id`
    ///
    /// Creates the pair's conversation on first contact. The returned view
    /// carries both display names.
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<MessageView, BackendError> {
        let sender = self
            .identity
            .get_user(sender_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Sender not found"))?;
        let receiver = self
            .identity
            .get_user(receiver_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Receiver not found"))?;

        let pair = ParticipantPair::new(sender_id, receiver_id)?;
        validate_content(content, self.max_message_length)?;

        let conversation = self.store.find_or_create_conversation(pair).await?;
        let message = self
            .store
            .append_message(conversation.id, sender_id, receiver_id, content)
            .await?;

        tracing::info!(
            "[Messaging] {} -> {} in conversation {} (message {})",
            sender_id,
            receiver_id,
            conversation.id,
            message.id
        );

        Ok(MessageView::named(
            message,
            sender.display_name(),
            receiver.display_name(),
        ))
    }

    /// The caller's conversations, most recently active first
    pub async fn list_conversations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, BackendError> {
        let entries = self.store.list_conversations_for_user(user_id).await?;

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(other_id) = entry.conversation.other_participant(user_id) else {
                continue;
            };
            let other_name = self.identity.display_name(other_id).await?;
            summaries.push(ConversationSummary {
                id: entry.conversation.id,
                other_participant_id: other_id,
                other_participant_name: other_name,
                created_at: entry.conversation.created_at,
                last_message_at: entry.conversation.last_message_at,
                last_message: entry.last_message.map(MessageView::bare),
                unread_count: entry.unread_count,
            });
        }

        Ok(summaries)
    }

    /// Load a conversation the caller participates in
    async fn authorize(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
    ) -> Result<Conversation, BackendError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Conversation not found"))?;

        if !conversation.has_participant(user_id) {
            tracing::warn!(
                "[Messaging] {} denied access to conversation {}",
                user_id,
                conversation_id
            );
            return Err(BackendError::forbidden("You are not part of this conversation"));
        }

        Ok(conversation)
    }

    async fn detail(
        &self,
        conversation: Conversation,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<ConversationDetail, BackendError> {
        let page = page.max(1);
        let page_size = page_size.max(self.min_page_size);

        let other_id = conversation
            .other_participant(user_id)
            .ok_or_else(|| BackendError::forbidden("You are not part of this conversation"))?;
        let user_name = self.identity.display_name(user_id).await?;
        let other_name = self.identity.display_name(other_id).await?;

        let result = self
            .store
            .list_messages_page(conversation.id, page, page_size)
            .await?;

        let messages = result
            .messages
            .into_iter()
            .map(|m| {
                let (sender_name, receiver_name) = if m.sender_id == user_id {
                    (user_name.clone(), other_name.clone())
                } else {
                    (other_name.clone(), user_name.clone())
                };
                MessageView::named(m, sender_name, receiver_name)
            })
            .collect();

        Ok(ConversationDetail {
            id: conversation.id,
            other_participant_id: other_id,
            other_participant_name: other_name,
            created_at: conversation.created_at,
            last_message_at: conversation.last_message_at,
            messages,
            total_messages: result.total,
            current_page: page,
            page_size,
        })
    }

    /// One page of a conversation (page 1 is the most recent window)
    pub async fn get_conversation(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<ConversationDetail, BackendError> {
        let conversation = self.authorize(conversation_id, user_id).await?;
        self.detail(conversation, user_id, page, page_size).await
    }

    /// The conversation between the caller and `other_user_id`, created if absent
    pub async fn get_or_create_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<ConversationDetail, BackendError> {
        if !self.identity.user_exists(other_user_id).await? {
            return Err(BackendError::not_found("User not found"));
        }

        let pair = ParticipantPair::new(user_id, other_user_id)?;
        let conversation = self.store.find_or_create_conversation(pair).await?;
        self.detail(conversation, user_id, 1, self.min_page_size).await
    }

    /// Mark everything addressed to the caller in this conversation as read
    ///
    /// Idempotent: a second call succeeds without touching any message.
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
    ) -> Result<bool, BackendError> {
        self.authorize(conversation_id, user_id).await?;
        let changed = self.store.mark_read_for_user(conversation_id, user_id).await?;
        if changed > 0 {
            tracing::debug!(
                "[Messaging] {} read {} message(s) in conversation {}",
                user_id,
                changed,
                conversation_id
            );
        }
        Ok(true)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, BackendError> {
        Ok(self.store.count_unread_for_user(user_id).await?)
    }

    /// The other participant of a conversation the caller belongs to
    pub async fn other_participant(
        &self,
        conversation_id: ConversationId,
        user_id: Uuid,
    ) -> Result<Uuid, BackendError> {
        let conversation = self.authorize(conversation_id, user_id).await?;
        conversation
            .other_participant(user_id)
            .ok_or_else(|| BackendError::forbidden("You are not part of this conversation"))
    }
}
