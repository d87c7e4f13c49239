//! Session token repository for database operations.
//!
//! Only token digests are stored. The opaque token itself exists exactly
//! twice: in the response that issued it and in the client's hands.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use ratebook_core::{TokenId, UserId};

use super::RepositoryError;
use super::users::UserRow;
use crate::models::{AuthToken, User};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AuthTokenRow {
    id: i64,
    user_id: i64,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<AuthTokenRow> for AuthToken {
    fn from(row: AuthTokenRow) -> Self {
        Self {
            id: TokenId::new(row.id),
            user_id: UserId::new(row.user_id),
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for session token database operations.
pub struct TokenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new session token digest for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, RepositoryError> {
        let row = sqlx::query_as::<_, AuthTokenRow>(
            r"
            INSERT INTO auth_tokens (user_id, token_hash, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, user_id, expires_at, created_at
            ",
        )
        .bind(user_id.as_i64())
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Resolve a token digest to its account, if the token is live at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the account data is
    /// invalid.
    pub async fn resolve(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT u.id, u.name, u.email, u.address, u.role, u.store_id,
                   u.created_at, u.updated_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = ?1 AND t.expires_at > ?2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete one session token by its digest. Deleting a digest that isn't
    /// stored is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke(&self, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM auth_tokens WHERE token_hash = ?1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Delete every session token an account holds. Returns how many were
    /// revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?1")
            .bind(user_id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
