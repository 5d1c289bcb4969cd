//! Backend Error Module
//!
//! Error types for the messaging service and HTTP layer.
//!
//! - **`types`** - `BackendError` and its status/kind mapping
//! - **`conversion`** - `IntoResponse` for JSON error bodies

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
