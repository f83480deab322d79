use async_trait::async_trait;
use axum::http::HeaderMap;
use sqlx::{postgres::PgRow, Row};
use tracing::debug;

use super::{
    extract_session_token, hash_session_token, AuthError, AuthSession, AuthUser, SessionProvider,
    SessionRecord,
};
use crate::database::Database;

/// Postgres-backed session lookup over the `sessions` and `users` tables.
pub struct PgSessionStore {
    db: Database,
    cookie_name: String,
}

impl PgSessionStore {
    pub fn new(db: Database, cookie_name: impl Into<String>) -> Self {
        Self {
            db,
            cookie_name: cookie_name.into(),
        }
    }

    fn session_from_row(row: &PgRow) -> Result<AuthSession, sqlx::Error> {
        Ok(AuthSession {
            user: AuthUser {
                id: row.try_get("user_id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                email_verified: row.try_get("email_verified")?,
                image: row.try_get("image")?,
            },
            session: SessionRecord {
                id: row.try_get("session_id")?,
                user_id: row.try_get("user_id")?,
                expires_at: row.try_get("expires_at")?,
                ip_address: row.try_get("ip_address")?,
                user_agent: row.try_get("user_agent")?,
                created_at: row.try_get("created_at")?,
            },
        })
    }
}

#[async_trait]
impl SessionProvider for PgSessionStore {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>, AuthError> {
        let Some(token) = extract_session_token(headers, &self.cookie_name) else {
            return Ok(None);
        };

        let query = r#"
            SELECT
                s.id AS session_id, s.user_id, s.expires_at, s.ip_address,
                s.user_agent, s.created_at,
                u.name, u.email, u.email_verified, u.image
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            AND s.expires_at > now()
        "#;

        let row = sqlx::query(query)
            .bind(hash_session_token(&token))
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(Self::session_from_row(&row)?)),
            None => {
                debug!("Session token did not match an active session");
                Ok(None)
            }
        }
    }

    async fn revoke_session(&self, headers: &HeaderMap) -> Result<bool, AuthError> {
        let Some(token) = extract_session_token(headers, &self.cookie_name) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(hash_session_token(&token))
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
