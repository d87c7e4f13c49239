//! Shared application state for HTTP handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::{AuthConfig, ServerConfig};

/// Shared application state.
///
/// Cloning is cheap: the inner state lives behind an [`Arc`], so every
/// handler sees the same configuration and connection pool.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get the session token settings.
    #[must_use]
    pub fn auth(&self) -> AuthConfig {
        self.inner.config.auth
    }
}
