//! # Scribe DB
//!
//! PostgreSQL pool and embedded migrations for the Scribe API.
//!
//! PostgreSQL is the source of truth; the cache only ever holds copies of
//! what is read from here.
//!
//! # Example
//!
//! ```ignore
//! use scribe_db::{DatabaseConfig, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()?).await?;
//! run_migrations(&pool).await?;
//! ```

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::Duration;
use tracing::info;

pub use sqlx::PgPool;

/// Migrations under the workspace `migrations/` directory, embedded at
/// compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Connection settings.
///
/// - `DATABASE_URL` (required)
/// - `DATABASE_MAX_CONNECTIONS` (default: 10)
/// - `DATABASE_ACQUIRE_TIMEOUT_SECS` (default: 5)
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is not set.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            url: env::var("DATABASE_URL")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(5)),
        })
    }
}

/// Opens a PostgreSQL connection pool.
///
/// Called once during startup; the returned pool is cheaply cloneable and
/// lives in the application state.
///
/// # Errors
///
/// Returns an error if the first connection cannot be established.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await?;

    info!(
        db.max_connections = config.max_connections,
        "Database pool initialized"
    );

    Ok(pool)
}

/// Applies pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
