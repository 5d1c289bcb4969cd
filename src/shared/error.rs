//! Shared Error Types
//!
//! This module defines error types for payload-level failures that can be
//! detected without touching storage: malformed JSON frames and field
//! validation (empty or oversized message content, self-addressed messages).
//!
//! # Usage
//!
//! ```rust
//! use dmrelay::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Message content is required");
//! ```
use thiserror::Error;

/// Payload errors shared by the REST surface and the realtime channel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
