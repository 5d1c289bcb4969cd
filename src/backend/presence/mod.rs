//! Presence Module
//!
//! Which users are online, and through which connections.

pub mod registry;

pub use registry::{ConnectionId, InMemoryPresence, PresenceRegistry};
