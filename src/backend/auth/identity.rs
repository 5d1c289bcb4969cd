//! User directory
//!
//! Messaging does not own user accounts. It only needs to know whether a
//! user exists and what to call them, which is what [`IdentityProvider`]
//! exposes.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use uuid::Uuid;

use crate::backend::messaging::store::StoreError;

/// Shown when a user has no usable name
pub const UNKNOWN_USER: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    pub fn new(id: Uuid, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", trimmed; [`UNKNOWN_USER`] if both parts are blank
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            UNKNOWN_USER.to_string()
        } else {
            name.to_string()
        }
    }
}

/// Lookup of users by id
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    async fn user_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.get_user(id).await?.is_some())
    }

    /// Display name for `id`, falling back to [`UNKNOWN_USER`] when the user
    /// is missing
    async fn display_name(&self, id: Uuid) -> Result<String, StoreError> {
        Ok(self
            .get_user(id)
            .await?
            .map(|u| u.display_name())
            .unwrap_or_else(|| UNKNOWN_USER.to_string()))
    }
}

/// Process-local directory, seeded by the embedding application or tests
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<Uuid, UserProfile>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.id, profile);
    }
}

#[async_trait]
impl IdentityProvider for MemoryDirectory {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }
}

/// Directory reading the mirrored `users` table
#[derive(Debug, Clone)]
pub struct SqlDirectory {
    pool: SqlitePool,
}

impl SqlDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a user row
    pub async fn upsert(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name) VALUES (?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET first_name = excluded.first_name, last_name = excluded.last_name
            "#,
        )
        .bind(profile.id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for SqlDirectory {
    async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT id, first_name, last_name FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<UserProfile, StoreError> {
            Ok(UserProfile {
                id: row.try_get("id")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
            })
        })
        .transpose()
    }
}
