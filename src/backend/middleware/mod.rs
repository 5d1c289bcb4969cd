//! Middleware Module
//!
//! HTTP middleware for the backend server.
//!
//! - **`auth`** - Bearer-token authentication for the messaging and realtime routes

pub mod auth;

pub use auth::{auth_middleware, extract_token, AuthenticatedUser};
