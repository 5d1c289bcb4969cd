//! Shared Module
//!
//! This module contains types that cross the wire: domain records, the REST
//! views built from them, the realtime event union, payload errors and the
//! application configuration. Nothing here touches storage or sockets.

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Messaging types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent};
