/**
 * API Routes
 *
 * Messaging REST endpoints and the realtime upgrade route. All of them run
 * behind `auth_middleware`.
 *
 * ## Messaging
 * - `POST /api/messages/send`
 * - `GET  /api/messages/conversations`
 * - `GET  /api/messages/conversations/{id}`
 * - `POST /api/messages/conversations/with/{other_user_id}`
 * - `PUT  /api/messages/conversations/{id}/read`
 * - `GET  /api/messages/unread-count`
 * - `GET  /api/messages/users/{user_id}/online`
 *
 * ## Realtime
 * - `GET /hubs/chat` - WebSocket upgrade
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::backend::messaging::handlers::{
    get_conversation, get_or_create_conversation, list_conversations, mark_conversation_read,
    send_message, unread_count, user_online,
};
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::chat_socket;
use crate::backend::server::state::AppState;

/// Add the authenticated API routes to `router`
pub fn configure_api_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/messages/send", post(send_message))
        .route("/api/messages/conversations", get(list_conversations))
        .route("/api/messages/conversations/{id}", get(get_conversation))
        .route(
            "/api/messages/conversations/with/{other_user_id}",
            post(get_or_create_conversation),
        )
        .route(
            "/api/messages/conversations/{id}/read",
            put(mark_conversation_read),
        )
        .route("/api/messages/unread-count", get(unread_count))
        .route("/api/messages/users/{user_id}/online", get(user_online))
        .route("/hubs/chat", get(chat_socket))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    router.merge(protected)
}
