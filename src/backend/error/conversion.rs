/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse`, so handlers can return them
 * directly. The body is JSON:
 *
 * ```json
 * { "error": "Conversation not found", "kind": "not_found", "status": 404 }
 * ```
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("[Http] Request failed: {:?}", self);
        } else {
            tracing::debug!("[Http] Request rejected ({}): {}", self.kind(), self);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
