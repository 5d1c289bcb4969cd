//! Messaging Module
//!
//! Two-party conversations, their message log and the operations on them.
//!
//! - **`store`** - `MessageStore` trait and `StoreError`
//! - **`memory`** / **`db`** - in-memory and SQLite stores
//! - **`service`** - `MessagingService`, the single entry point for messaging operations
//! - **`handlers`** - REST handlers

pub mod store;
pub mod memory;
pub mod db;
pub mod service;
pub mod handlers;

pub use db::SqlStore;
pub use memory::MemoryStore;
pub use service::MessagingService;
pub use store::{MessageStore, StoreError};
