//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RATEBOOK_DATABASE_URL` - `SQLite` connection string (e.g., `sqlite://ratebook.db`)
//!
//! ## Optional
//! - `RATEBOOK_HOST` - Bind address (default: 127.0.0.1)
//! - `RATEBOOK_PORT` - Listen port (default: 8080)
//! - `RATEBOOK_TOKEN_TTL_SECS` - Session token lifetime in seconds (default: 86400)
//! - `RATEBOOK_LOG_JSON` - Emit JSON logs when set (read by `main`, not here)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session token settings
    pub auth: AuthConfig,
}

/// Session token configuration.
#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// How long an issued session token stays valid
    pub token_ttl: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("RATEBOOK_DATABASE_URL")?;
        let host = get_env_or_default("RATEBOOK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RATEBOOK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("RATEBOOK_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("RATEBOOK_PORT".to_string(), e.to_string()))?;
        let auth = AuthConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            auth,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs = get_env_or_default("RATEBOOK_TOKEN_TTL_SECS", "86400")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("RATEBOOK_TOKEN_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            token_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., RATEBOOK_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
