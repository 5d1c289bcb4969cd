//! Backend Module
//!
//! All server-side code for dmrelay: an Axum HTTP server exposing the
//! messaging REST API and a WebSocket realtime channel.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`messaging`** - Conversation/message store and the messaging service
//! - **`presence`** - Which users are online through which connections
//! - **`realtime`** - Realtime gateway and WebSocket transport
//! - **`auth`** - JWT verification and the user directory
//! - **`middleware`** - Request authentication
//! - **`error`** - Backend error type and its HTTP rendering
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── messaging/      - Store, service, REST handlers
//! ├── presence/       - Presence registry
//! ├── realtime/       - Gateway, hub, socket
//! ├── auth/           - Sessions and identity
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Control Flow
//!
//! REST calls and realtime events both end in `MessagingService`. The
//! gateway additionally consults the presence registry to pick fan-out
//! targets and to decide when a user has gone fully offline.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Conversations and messages
pub mod messaging;

/// Online presence tracking
pub mod presence;

/// Real-time delivery
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and user directory
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use messaging::MessagingService;
pub use realtime::RealtimeGateway;
pub use server::create_app;
