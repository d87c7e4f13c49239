//! Bearer-token session domain type.

use chrono::{DateTime, Utc};

use ratebook_core::{TokenId, UserId};

/// A stored session token (domain type).
///
/// Carries only the hash of the bearer secret; the raw token is returned
/// once at login and never persisted.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Unique token ID.
    pub id: TokenId,
    /// Account the token authenticates.
    pub user_id: UserId,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}
