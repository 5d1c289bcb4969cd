//! Messaging HTTP Handlers
//!
//! REST surface over [`MessagingService`]. Every handler runs behind the auth
//! middleware and acts as the [`AuthenticatedUser`] it attached. Successful
//! responses are wrapped in [`ApiResponse`]; failures render through
//! `BackendError`'s `IntoResponse`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::service::MessagingService;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::realtime::RealtimeGateway;
use crate::shared::messaging::{
    ConversationDetail, ConversationId, ConversationSummary, MessageView, SendMessageRequest,
};
use crate::shared::ServerEvent;

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineStatus {
    pub user_id: Uuid,
    pub is_online: bool,
}

/// `POST /api/messages/send`
pub async fn send_message(
    State(service): State<MessagingService>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<MessageView>>, BackendError> {
    let message = service
        .send_message(user.user_id, request.receiver_id, &request.content)
        .await?;
    Ok(ApiResponse::ok("Message sent successfully", message))
}

/// `GET /api/messages/conversations`
pub async fn list_conversations(
    State(service): State<MessagingService>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, BackendError> {
    let conversations = service.list_conversations(user.user_id).await?;
    Ok(ApiResponse::ok("Conversations retrieved successfully", conversations))
}

/// `GET /api/messages/conversations/{id}?page=&page_size=`
pub async fn get_conversation(
    State(service): State<MessagingService>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ConversationDetail>>, BackendError> {
    let detail = service
        .get_conversation(
            conversation_id,
            user.user_id,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(0),
        )
        .await?;
    Ok(ApiResponse::ok("Conversation retrieved successfully", detail))
}

/// `POST /api/messages/conversations/with/{other_user_id}`
pub async fn get_or_create_conversation(
    State(service): State<MessagingService>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(other_user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ConversationDetail>>, BackendError> {
    let detail = service
        .get_or_create_conversation(user.user_id, other_user_id)
        .await?;
    Ok(ApiResponse::ok("Conversation retrieved successfully", detail))
}

/// `PUT /api/messages/conversations/{id}/read`
///
/// Also pushes a read receipt to the other participant's live connections,
/// same as the realtime `mark-as-read` event.
pub async fn mark_conversation_read(
    State(gateway): State<RealtimeGateway>,
    State(service): State<MessagingService>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<ApiResponse<bool>>, BackendError> {
    let other_id = service.other_participant(conversation_id, user.user_id).await?;
    let marked = service.mark_read(conversation_id, user.user_id).await?;
    if marked {
        gateway
            .fan_out(other_id, ServerEvent::MessagesRead { conversation_id })
            .await;
    }
    Ok(ApiResponse::ok("Messages marked as read", marked))
}

/// `GET /api/messages/unread-count`
pub async fn unread_count(
    State(service): State<MessagingService>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<i64>>, BackendError> {
    let unread_count = service.unread_count(user.user_id).await?;
    Ok(ApiResponse::ok("Unread count retrieved successfully", unread_count))
}

/// `GET /api/messages/users/{user_id}/online`
pub async fn user_online(
    State(gateway): State<RealtimeGateway>,
    Path(user_id): Path<Uuid>,
) -> Json<ApiResponse<OnlineStatus>> {
    let is_online = gateway.is_user_online(user_id).await;
    ApiResponse::ok("Online status retrieved", OnlineStatus { user_id, is_online })
}

/// `GET /health`
pub async fn health() -> Json<ApiResponse<&'static str>> {
    ApiResponse::ok("Service is healthy", "ok")
}
