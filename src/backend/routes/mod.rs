//! Route Configuration Module
//!
//! - **`router`** - Main router creation and layer stack
//! - **`api_routes`** - Authenticated messaging and realtime routes
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! └── api_routes.rs   - /api/messages/* and /hubs/chat
//! ```

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
