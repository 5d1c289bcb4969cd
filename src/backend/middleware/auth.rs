/**
 * Authentication Middleware
 *
 * Protects the messaging routes. The bearer token is read from the
 * `Authorization` header, or from the `access_token` query parameter for
 * WebSocket upgrades where browsers cannot set headers. The token's subject
 * must be a user known to the identity directory.
 */

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::auth::sessions::get_user_id_from_token;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated user data extracted from JWT token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Locate the bearer token in a request
pub fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        return header
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::to_string);
    }
    let Query(query) = Query::<TokenQuery>::try_from_uri(&parts.uri).ok()?;
    query.access_token.filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Attaches [`AuthenticatedUser`] to the request extensions. Missing,
/// malformed, expired or unknown-subject tokens are rejected with 401.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let (mut parts, body) = request.into_parts();

    let token = extract_token(&parts).ok_or_else(|| {
        tracing::warn!("Missing bearer token on {}", parts.uri.path());
        BackendError::unauthorized("Missing bearer token")
    })?;

    let user_id = get_user_id_from_token(&token, &app_state.config.jwt_secret).map_err(|e| {
        tracing::warn!("Invalid token: {}", e);
        BackendError::unauthorized("Invalid token")
    })?;

    if !app_state.messaging.identity().user_exists(user_id).await? {
        tracing::warn!("Token subject {} is not a known user", user_id);
        return Err(BackendError::unauthorized("Unknown user"));
    }

    parts.extensions.insert(AuthenticatedUser { user_id });
    Ok(next.run(Request::from_parts(parts, body)).await)
}
