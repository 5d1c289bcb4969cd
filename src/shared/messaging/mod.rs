//! Messaging Module
//!
//! This module contains all the data structures for direct messaging:
//!
//! - `Message` / `MessageView` - A message and its client-facing view
//! - `Conversation` - The unique context between two users
//! - `ConversationSummary` / `ConversationDetail` - List and detail views
//!
//! # Usage
//!
//! ```rust
//! use dmrelay::shared::messaging::{Conversation, Message, ParticipantPair};
//! ```

pub mod conversation;
pub mod message;

pub use conversation::{
    Conversation, ConversationDetail, ConversationEntry, ConversationSummary, MessagePage,
    ParticipantPair,
};
pub use message::{
    validate_content, ConversationId, Message, MessageId, MessageView, SendMessageRequest,
};
