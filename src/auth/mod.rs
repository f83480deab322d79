pub mod store;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use store::PgSessionStore;

/// The authenticated user as exposed to handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
}

/// Session metadata owned by the session store. Never mutated per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A verified session and the user it belongs to. Both halves always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub session: SessionRecord,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),

    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}

/// Session lookup capability of the authentication provider.
///
/// Implementations own token verification. `Ok(None)` means "no valid
/// session"; `Err` means the lookup itself failed and must not be read as
/// unauthenticated.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>, AuthError>;

    /// Invalidates the session carried by `headers`. Returns whether a session was removed.
    async fn revoke_session(&self, headers: &HeaderMap) -> Result<bool, AuthError>;
}

/// Extract the session token from a Bearer Authorization header or the session cookie.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Only the digest is stored; raw tokens are never compared against the database.
pub fn hash_session_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
