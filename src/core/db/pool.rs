//! PostgreSQL connection pool
//!
//! Opens the pool for `DATABASE_URL`, applies the embedded migrations and
//! checks that the server answers before the store is handed out.

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// Upper bound on pooled connections
const MAX_CONNECTIONS: u32 = 10;

/// How long a request waits for a free connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle connections are closed after this long
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Database errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Connect to `database_url` without touching the schema
pub async fn create_pool(database_url: &str) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Connect and bring the `users` table up to date
pub async fn create_pool_with_migrations(database_url: &str) -> Result<PgPool, DbError> {
    let pool = create_pool(database_url).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}

/// Round-trip a trivial query
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
