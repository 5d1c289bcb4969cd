//! Real-time Module
//!
//! Live delivery of messaging events over WebSockets.
//!
//! # Architecture
//!
//! - **`hub`** - Per-connection bounded outbound queues
//! - **`gateway`** - Connection lifecycle, inbound event dispatch and fan-out
//! - **`socket`** - The axum WebSocket handler bridging a socket to the gateway
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs      - Module exports and documentation
//! ├── hub.rs      - Outbound queues, keyed by connection
//! ├── gateway.rs  - RealtimeGateway
//! └── socket.rs   - GET /hubs/chat
//! ```
//!
//! # Delivery
//!
//! Fan-out is best-effort. An event that cannot be queued for one connection
//! (queue full or socket gone) is dropped for that connection only. Persisted
//! state is never rolled back because a push failed.

/// Outbound connection queues
pub mod hub;

/// Connection lifecycle and event dispatch
pub mod gateway;

/// WebSocket transport
pub mod socket;

pub use gateway::RealtimeGateway;
pub use hub::{ConnectionHandle, ConnectionHub};
pub use socket::chat_socket;
