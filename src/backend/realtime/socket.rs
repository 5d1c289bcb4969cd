/**
 * WebSocket Transport
 *
 * `GET /hubs/chat` upgrades an authenticated request to a WebSocket and
 * binds it to the gateway. The socket is split: a writer task drains the
 * connection's outbound queue while the request task reads inbound frames.
 * The connection ends when the client closes, the transport errors, or the
 * writer stops; in every case the gateway is told to disconnect it.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use super::gateway::RealtimeGateway;
use crate::backend::middleware::AuthenticatedUser;

/// Upgrade handler for the realtime channel
pub async fn chat_socket(
    State(gateway): State<RealtimeGateway>,
    Extension(user): Extension<AuthenticatedUser>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_connection(gateway, user.user_id, socket))
}

async fn run_connection(gateway: RealtimeGateway, user_id: Uuid, socket: WebSocket) {
    let (handle, mut outbound) = gateway.connect(user_id).await;
    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("[Gateway] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => gateway.handle_frame(handle, text.as_str()).await,
                Some(Ok(Message::Binary(_))) => gateway.reject(handle, "Binary frames are not supported"),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("[Gateway] Transport error on {}: {}", handle.connection_id, e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    gateway.disconnect(handle).await;
    writer.abort();
}
