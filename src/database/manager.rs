use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::Env;

/// Errors from the shared database handle
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Long-lived, process-wide database handle.
///
/// Cloning is cheap; the underlying pool does its own synchronization, so the
/// handle is shared across every concurrent request without extra locking.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Build the pool without opening a connection. The first query connects.
    pub fn connect_lazy(env: &Env) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(env.database_max_connections)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_lazy(env.database_url())
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;

        info!(
            max_connections = env.database_max_connections,
            "Created lazy database pool"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Applies the embedded schema migrations (users, sessions, accounts, verifications).
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{env_from, valid_vars};

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        let env = env_from(&valid_vars()).unwrap();
        let db = Database::connect_lazy(&env).expect("lazy pool");
        assert_eq!(db.pool().size(), 0);
    }
}
