/**
 * Backend Error Types
 *
 * Errors surfaced by the messaging service and HTTP handlers. Each variant
 * maps to an HTTP status and a stable `kind` string so REST and realtime
 * callers receive the same structured failure.
 *
 * # Error Categories
 *
 * - `NotFound` - referenced user or conversation absent
 * - `Forbidden` - caller is not a participant of the conversation
 * - `Validation` - empty/oversized content, self-addressed messages
 * - `Unauthorized` - missing or invalid bearer token
 * - `Storage` - the store failed (store conflicts never reach callers)
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::messaging::store::StoreError;
use crate::shared::SharedError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error(transparent)]
    Validation(#[from] SharedError),

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl BackendError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Storage(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::Storage(StoreError::NotFound { .. }) => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Validation(_) => "validation",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Storage(_) => "storage",
        }
    }

    /// Human-readable message, safe to show to the caller
    pub fn message(&self) -> String {
        match self {
            Self::NotFound { message }
            | Self::Forbidden { message }
            | Self::Unauthorized { message } => message.clone(),
            Self::Validation(SharedError::ValidationError { message, .. }) => message.clone(),
            Self::Validation(err) => err.to_string(),
            Self::Storage(StoreError::NotFound { what }) => format!("{} not found", what),
            // Database details stay in the logs
            Self::Storage(_) => "Storage failure".to_string(),
        }
    }
}
