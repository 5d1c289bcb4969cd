//! dmrelay - Direct Messaging Relay
//!
//! Two-party direct messaging with read state, unread counts, presence and
//! realtime fan-out to every device a user has connected.
//!
//! # Module Structure
//!
//! - **`shared`** - Types that cross the wire
//!   - Message and conversation records and views
//!   - The realtime event union (`ClientEvent`, `ServerEvent`)
//!   - Configuration and payload validation errors
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server and WebSocket gateway
//!   - Conversation/message stores (SQLite and in-memory)
//!   - Presence registry and connection fan-out
//!   - JWT authentication against a user directory
//!
//! # Usage
//!
//! ```rust,no_run
//! use dmrelay::backend::server::create_app;
//! use dmrelay::shared::AppConfig;
//!
//! # async fn example() {
//! let app = create_app(AppConfig::default()).await;
//! // Serve `app` with axum::serve
//! # }
//! ```
//!
//! # Guarantees
//!
//! - At most one conversation exists per unordered pair of users, even
//!   under concurrent first sends
//! - Messages of a conversation are ordered by `(sent_at, id)`
//! - A user is announced offline only once their last connection closes

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
