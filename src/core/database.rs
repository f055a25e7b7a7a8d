use crate::core::config::DatabaseConfig;
use crate::core::error::{AppError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;

/// One transactional scope spanning all writes of a single request.
///
/// Dropping it without `commit` rolls back and returns the connection to the pool.
pub type UnitOfWork = Transaction<'static, Postgres>;

pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

pub async fn begin(pool: &PgPool) -> Result<UnitOfWork> {
    pool.begin().await.map_err(|e| {
        tracing::error!("Failed to open unit of work: {:?}", e);
        AppError::StorageUnavailable(e.to_string())
    })
}

pub async fn commit(uow: UnitOfWork) -> Result<()> {
    uow.commit().await.map_err(|e| {
        tracing::error!("Failed to commit unit of work: {:?}", e);
        AppError::Database(e)
    })
}
