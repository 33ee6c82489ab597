//! Sqlite-backed implementations of the qharvest store interfaces.
//!
//! The collection subsystem only sees the narrow traits from
//! `qharvest-core`; everything sqlx-specific stays behind this crate.

pub mod answers;
pub mod problems;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub use answers::SqliteAnswerStore;
pub use problems::SqliteProblemStore;

// Path relative to crates/qharvest-db/Cargo.toml; resolves to
// <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connects a sqlite pool, creating the database file if it is missing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the URL does not parse or the connection
/// cannot be established.
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Applies pending migrations.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if a migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
