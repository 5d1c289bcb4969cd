/**
 * Session Tokens
 *
 * Callers authenticate with an HS256 JWT whose `sub` claim is the user's
 * UUID. Tokens are issued by the identity service in production; the
 * `create_token` helper exists for local runs and tests.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime: 30 days
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token verification failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("invalid user id in token: {0}")]
    Subject(#[from] uuid::Error),
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Create a signed token for `user_id` that expires after `ttl_secs`
pub fn create_token(user_id: Uuid, secret: &str, ttl_secs: u64) -> Result<String, SessionError> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verify and decode a JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(token_data.claims)
}

/// Extract the user id carried by a valid token
pub fn get_user_id_from_token(token: &str, secret: &str) -> Result<Uuid, SessionError> {
    let claims = verify_token(token, secret)?;
    Ok(Uuid::parse_str(&claims.sub)?)
}
