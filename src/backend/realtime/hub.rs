/**
 * Connection Hub
 *
 * Owns the outbound queue of every live realtime connection. Each connection
 * gets a bounded `mpsc` channel; the socket task drains it. Delivery uses
 * `try_send`, so a slow or vanished connection never blocks the sender: the
 * event is dropped for that connection only and the drop is logged.
 */

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::presence::ConnectionId;
use crate::shared::ServerEvent;

/// The connection an operation is performed on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    pub connection_id: ConnectionId,
    pub user_id: Uuid,
}

impl ConnectionHandle {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            user_id,
        }
    }
}

struct Outbound {
    user_id: Uuid,
    sender: mpsc::Sender<ServerEvent>,
}

#[derive(Default)]
pub struct ConnectionHub {
    connections: DashMap<ConnectionId, Outbound>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbound queue for `handle`; the receiver feeds the socket
    pub fn register(&self, handle: ConnectionHandle, capacity: usize) -> mpsc::Receiver<ServerEvent> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.connections.insert(
            handle.connection_id,
            Outbound {
                user_id: handle.user_id,
                sender,
            },
        );
        receiver
    }

    pub fn unregister(&self, connection_id: ConnectionId) -> bool {
        self.connections.remove(&connection_id).is_some()
    }

    /// Queue `event` for one connection; `false` if it was not delivered
    pub fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        let Some(outbound) = self.connections.get(&connection_id) else {
            tracing::debug!("[Realtime] No outbound queue for connection {}", connection_id);
            return false;
        };

        match outbound.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    "[Realtime] Outbound queue full for connection {}, dropping {}",
                    connection_id,
                    event.name()
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::debug!(
                    "[Realtime] Connection {} closed before {} was delivered",
                    connection_id,
                    event.name()
                );
                false
            }
        }
    }

    /// Queue `event` for each connection, returning how many accepted it
    pub fn send_to_many(&self, connection_ids: &[ConnectionId], event: &ServerEvent) -> usize {
        connection_ids
            .iter()
            .filter(|id| self.send_to(**id, event.clone()))
            .count()
    }

    /// Queue `event` for every connection not owned by `user_id`
    pub fn broadcast_except_user(&self, user_id: Uuid, event: &ServerEvent) -> usize {
        let targets: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|entry| entry.value().user_id != user_id)
            .map(|entry| *entry.key())
            .collect();
        self.send_to_many(&targets, event)
    }
}
