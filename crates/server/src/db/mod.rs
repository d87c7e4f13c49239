//! Database operations for the Ratebook `SQLite` store.
//!
//! ## Tables
//!
//! - `users` - Accounts with role and optional owned-store link
//! - `stores` - Store directory rows with cached rating aggregates
//! - `ratings` - One rating per (user, store) pair
//! - `auth_tokens` - Hashed bearer tokens with expiry
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p ratebook-cli -- migrate
//! ```

pub mod listing;
pub mod ratings;
pub mod stores;
pub mod tokens;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use ratings::RatingRepository;
pub use stores::StoreRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;

/// Embedded schema migrations, shared by the server, the CLI, and tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// WAL journaling plus a busy timeout lets readers proceed while a write
/// transaction recomputes aggregates; the single-connection pool serializes
/// the read-aggregate-write sequences on top of that. Foreign keys are
/// enforced on the connection.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Create a fully migrated in-memory pool.
///
/// The pool keeps its single connection alive forever; an in-memory database
/// lives exactly as long as its connection does.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established or a
/// migration fails.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}
