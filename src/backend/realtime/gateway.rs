/**
 * Realtime Gateway
 *
 * Binds live connections to users and turns inbound `ClientEvent`s into
 * messaging operations. Outbound events are fanned out to every connection
 * the presence registry knows for the target user.
 *
 * Every operation takes the `ConnectionHandle` it runs for. Application
 * failures are reported to that connection as an `error` event; the
 * connection itself stays open.
 */

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::hub::{ConnectionHandle, ConnectionHub};
use crate::backend::error::BackendError;
use crate::backend::messaging::service::MessagingService;
use crate::backend::presence::PresenceRegistry;
use crate::shared::config::DEFAULT_OUTBOUND_BUFFER;
use crate::shared::messaging::{ConversationId, MessageView};
use crate::shared::{ClientEvent, ServerEvent};

#[derive(Clone)]
pub struct RealtimeGateway {
    service: MessagingService,
    presence: Arc<dyn PresenceRegistry>,
    hub: Arc<ConnectionHub>,
    outbound_buffer: usize,
}

impl RealtimeGateway {
    pub fn new(service: MessagingService, presence: Arc<dyn PresenceRegistry>) -> Self {
        Self {
            service,
            presence,
            hub: Arc::new(ConnectionHub::new()),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    pub fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = capacity;
        self
    }

    /// Register a new connection for `user_id` and announce the user online
    ///
    /// Returns the handle to pass into every later call and the queue the
    /// socket writer drains.
    pub async fn connect(&self, user_id: Uuid) -> (ConnectionHandle, mpsc::Receiver<ServerEvent>) {
        let handle = ConnectionHandle::new(user_id);
        let outbound = self.hub.register(handle, self.outbound_buffer);
        self.presence.add_connection(user_id, handle.connection_id).await;

        let notified = self.hub.broadcast_except_user(
            user_id,
            &ServerEvent::UserStatusChanged {
                user_id,
                is_online: true,
            },
        );
        tracing::info!(
            "[Gateway] {} connected ({}), notified {} connection(s)",
            user_id,
            handle.connection_id,
            notified
        );

        (handle, outbound)
    }

    /// Tear down a connection; the user is announced offline only once their
    /// last connection is gone
    pub async fn disconnect(&self, handle: ConnectionHandle) {
        let removed = self.presence.remove_connection(handle.connection_id).await;
        self.hub.unregister(handle.connection_id);

        let Some(user_id) = removed else {
            tracing::debug!("[Gateway] Connection {} already removed", handle.connection_id);
            return;
        };

        if self.presence.is_online(user_id).await {
            tracing::debug!("[Gateway] {} still has other connections", user_id);
            return;
        }

        let notified = self.hub.broadcast_except_user(
            user_id,
            &ServerEvent::UserStatusChanged {
                user_id,
                is_online: false,
            },
        );
        tracing::info!("[Gateway] {} went offline, notified {} connection(s)", user_id, notified);
    }

    /// Deliver `event` to every connection of `user_id`
    pub async fn fan_out(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let connections = self.presence.connections_for(user_id).await;
        let delivered = self.hub.send_to_many(&connections, &event);
        tracing::debug!(
            "[Gateway] {} -> {}: {}/{} connection(s)",
            event.name(),
            user_id,
            delivered,
            connections.len()
        );
        delivered
    }

    fn reply(&self, handle: ConnectionHandle, event: ServerEvent) {
        self.hub.send_to(handle.connection_id, event);
    }

    /// Report a transport-level problem to one connection
    pub fn reject(&self, handle: ConnectionHandle, message: impl Into<String>) {
        self.reply(handle, ServerEvent::error(message));
    }

    /// Parse and dispatch one inbound text frame
    pub async fn handle_frame(&self, handle: ConnectionHandle, frame: &str) {
        match ClientEvent::parse(frame) {
            Ok(event) => self.handle_event(handle, event).await,
            Err(err) => {
                tracing::debug!("[Gateway] Bad frame from {}: {}", handle.connection_id, err);
                self.reply(handle, ServerEvent::error(format!("Invalid event: {}", err)));
            }
        }
    }

    pub async fn handle_event(&self, handle: ConnectionHandle, event: ClientEvent) {
        let result = match event {
            ClientEvent::SendMessage {
                receiver_id,
                content,
            } => self.send_message(handle, receiver_id, &content).await.map(|_| ()),
            ClientEvent::MarkAsRead { conversation_id } => {
                self.mark_as_read(handle, conversation_id).await
            }
            ClientEvent::IsUserOnline { user_id } => {
                let is_online = self.is_user_online(user_id).await;
                self.reply(handle, ServerEvent::OnlineStatus { user_id, is_online });
                Ok(())
            }
            ClientEvent::StartTyping {
                conversation_id,
                receiver_id,
            } => {
                self.typing(handle, conversation_id, receiver_id, true).await;
                Ok(())
            }
            ClientEvent::StopTyping {
                conversation_id,
                receiver_id,
            } => {
                self.typing(handle, conversation_id, receiver_id, false).await;
                Ok(())
            }
        };

        if let Err(err) = result {
            tracing::debug!(
                "[Gateway] Operation failed for {} ({}): {}",
                handle.user_id,
                err.kind(),
                err
            );
            self.reply(handle, ServerEvent::error(err.message()));
        }
    }

    /// Persist a message, echo it to the calling connection and push it to
    /// every connection of the receiver
    pub async fn send_message(
        &self,
        handle: ConnectionHandle,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<MessageView, BackendError> {
        let message = self
            .service
            .send_message(handle.user_id, receiver_id, content)
            .await?;

        self.reply(
            handle,
            ServerEvent::MessageSent {
                message: message.clone(),
            },
        );
        self.fan_out(
            receiver_id,
            ServerEvent::ReceiveMessage {
                message: message.clone(),
            },
        )
        .await;

        Ok(message)
    }

    /// Mark the conversation read for the caller and send a read receipt to
    /// the other participant
    pub async fn mark_as_read(
        &self,
        handle: ConnectionHandle,
        conversation_id: ConversationId,
    ) -> Result<(), BackendError> {
        let other_id = self
            .service
            .other_participant(conversation_id, handle.user_id)
            .await?;
        if self.service.mark_read(conversation_id, handle.user_id).await? {
            self.fan_out(other_id, ServerEvent::MessagesRead { conversation_id })
                .await;
        }
        Ok(())
    }

    /// Forward a typing indicator; dropped when the connection no longer
    /// resolves to a user
    pub async fn typing(
        &self,
        handle: ConnectionHandle,
        conversation_id: ConversationId,
        receiver_id: Uuid,
        started: bool,
    ) {
        let Some(user_id) = self.presence.user_for(handle.connection_id).await else {
            tracing::debug!(
                "[Gateway] Dropping typing event from unknown connection {}",
                handle.connection_id
            );
            return;
        };

        let event = if started {
            ServerEvent::UserTyping {
                conversation_id,
                user_id,
            }
        } else {
            ServerEvent::UserStoppedTyping {
                conversation_id,
                user_id,
            }
        };
        self.fan_out(receiver_id, event).await;
    }

    pub async fn is_user_online(&self, user_id: Uuid) -> bool {
        self.presence.is_online(user_id).await
    }
}
