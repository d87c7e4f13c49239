//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! rb-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `RATEBOOK_DATABASE_URL` - `SQLite` connection string
//!   (e.g. `sqlite://ratebook.db`). Falls back to `DATABASE_URL`.
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! binary at compile time, so the CLI can be deployed on its own.

use secrecy::SecretString;
use tracing::info;

use ratebook_server::db;

/// Errors returned by the migrate command.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// No database URL in the environment.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Connection or pool setup failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration could not be applied.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply any pending migrations to the configured database.
///
/// The pool opens with `create_if_missing`, so pointing this at a fresh path
/// bootstraps the database file as well.
///
/// # Errors
///
/// Returns [`MigrationError`] if no database URL is set, the connection
/// fails, or a migration cannot be applied.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("RATEBOOK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("RATEBOOK_DATABASE_URL"))?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
