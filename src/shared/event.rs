/**
 * Real-time Event System
 *
 * This module defines the closed set of events exchanged over the realtime
 * channel. Frames are JSON objects of the form
 * `{"event": "<kebab-case-name>", "data": {...}}`.
 *
 * - `ClientEvent` - frames a connected client may send
 * - `ServerEvent` - frames the server pushes to connections
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::messaging::{ConversationId, MessageView};

/// Inbound frame from a connected client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    SendMessage {
        receiver_id: Uuid,
        content: String,
    },
    MarkAsRead {
        conversation_id: ConversationId,
    },
    IsUserOnline {
        user_id: Uuid,
    },
    StartTyping {
        conversation_id: ConversationId,
        receiver_id: Uuid,
    },
    StopTyping {
        conversation_id: ConversationId,
        receiver_id: Uuid,
    },
}

impl ClientEvent {
    /// Parse a text frame
    pub fn parse(frame: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// Outbound frame pushed to a connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A user came online or went fully offline
    UserStatusChanged { user_id: Uuid, is_online: bool },
    /// Delivery confirmation to the sending connection
    MessageSent { message: MessageView },
    /// New message for one of the receiver's connections
    ReceiveMessage { message: MessageView },
    /// The other participant read the conversation
    MessagesRead { conversation_id: ConversationId },
    UserTyping { conversation_id: ConversationId, user_id: Uuid },
    UserStoppedTyping { conversation_id: ConversationId, user_id: Uuid },
    /// Reply to an `is-user-online` query
    OnlineStatus { user_id: Uuid, is_online: bool },
    /// Application-level failure, addressed to the triggering connection only
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserStatusChanged { .. } => "user-status-changed",
            Self::MessageSent { .. } => "message-sent",
            Self::ReceiveMessage { .. } => "receive-message",
            Self::MessagesRead { .. } => "messages-read",
            Self::UserTyping { .. } => "user-typing",
            Self::UserStoppedTyping { .. } => "user-stopped-typing",
            Self::OnlineStatus { .. } => "online-status",
            Self::Error { .. } => "error",
        }
    }

    /// Serialize into a text frame
    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
