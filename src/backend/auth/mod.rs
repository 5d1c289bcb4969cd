//! Authentication Module
//!
//! Identity for the messaging service: bearer-token verification and the
//! user directory used for existence checks and display names.
//!
//! - **`sessions`** - JWT creation and validation
//! - **`identity`** - `IdentityProvider` trait with in-memory and SQLite directories
//!
//! Account management (signup, login, passwords) lives in a separate
//! identity service; this module only consumes what it issues.

/// JWT token generation and validation
pub mod sessions;

/// User directory lookups
pub mod identity;

pub use identity::{IdentityProvider, MemoryDirectory, SqlDirectory, UserProfile, UNKNOWN_USER};
pub use sessions::{create_token, get_user_id_from_token, verify_token, Claims, SessionError};
