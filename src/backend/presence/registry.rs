/**
 * Presence Registry
 *
 * Tracks which live connections belong to which user. State is held in two
 * `DashMap`s: `user -> set of connections` and the reverse
 * `connection -> user`. Both are updated under the per-user shard lock of the
 * forward map, so a user's entry is created and removed atomically with
 * respect to other operations on the same user.
 *
 * # Extension point
 *
 * `PresenceRegistry` is a trait so that a shared backing store (e.g. a
 * key-value service with per-connection TTL keys) can replace the in-memory
 * map when several gateway processes serve the same users. Only
 * single-process presence is implemented here.
 */

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// Identifier of one live realtime connection
pub type ConnectionId = Uuid;

#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Register `connection_id` for `user_id`; a user may hold any number
    async fn add_connection(&self, user_id: Uuid, connection_id: ConnectionId);

    /// Drop a connection, returning the user it belonged to. Removing an
    /// unknown or already-removed connection is a no-op.
    async fn remove_connection(&self, connection_id: ConnectionId) -> Option<Uuid>;

    /// Owner of a live connection
    async fn user_for(&self, connection_id: ConnectionId) -> Option<Uuid>;

    /// Snapshot of a user's connections, possibly empty
    async fn connections_for(&self, user_id: Uuid) -> Vec<ConnectionId>;

    async fn is_online(&self, user_id: Uuid) -> bool;
}

/// Single-process registry
#[derive(Debug, Default)]
pub struct InMemoryPresence {
    by_user: DashMap<Uuid, HashSet<ConnectionId>>,
    by_connection: DashMap<ConnectionId, Uuid>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with at least one connection
    pub fn online_users(&self) -> usize {
        self.by_user.len()
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresence {
    async fn add_connection(&self, user_id: Uuid, connection_id: ConnectionId) {
        let mut connections = self.by_user.entry(user_id).or_default();
        connections.insert(connection_id);
        self.by_connection.insert(connection_id, user_id);
        tracing::debug!(
            "[Presence] {} connected via {} ({} connection(s))",
            user_id,
            connection_id,
            connections.len()
        );
    }

    async fn remove_connection(&self, connection_id: ConnectionId) -> Option<Uuid> {
        let user_id = *self.by_connection.get(&connection_id)?;

        // Reverse entry is dropped while the forward shard is held, so a
        // concurrent add for the same user observes either both or neither.
        match self.by_user.entry(user_id) {
            Entry::Occupied(mut entry) => {
                if self.by_connection.remove(&connection_id).is_none() {
                    return None;
                }
                entry.get_mut().remove(&connection_id);
                if entry.get().is_empty() {
                    entry.remove();
                    tracing::debug!("[Presence] {} has no connections left", user_id);
                }
                Some(user_id)
            }
            Entry::Vacant(_) => {
                self.by_connection.remove(&connection_id);
                None
            }
        }
    }

    async fn user_for(&self, connection_id: ConnectionId) -> Option<Uuid> {
        self.by_connection.get(&connection_id).map(|entry| *entry)
    }

    async fn connections_for(&self, user_id: Uuid) -> Vec<ConnectionId> {
        self.by_user
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn is_online(&self, user_id: Uuid) -> bool {
        self.by_user.contains_key(&user_id)
    }
}
