//! Rating ledger domain types.

use chrono::{DateTime, Utc};

use ratebook_core::{Email, PersonName, RatingId, RatingValue, StoreId, UserId};

/// One rating on the ledger (domain type).
///
/// At most one exists per (user, store) pair; only the value may change
/// after creation, and only at the hand of the submitting user.
#[derive(Debug, Clone)]
pub struct Rating {
    /// Unique rating ID.
    pub id: RatingId,
    /// Account that submitted the rating.
    pub user_id: UserId,
    /// Store the rating is against.
    pub store_id: StoreId,
    /// Star value, 1–5.
    pub rating: RatingValue,
    /// When the rating was first submitted.
    pub created_at: DateTime<Utc>,
    /// When the value was last revised.
    pub updated_at: DateTime<Utc>,
}

/// A rating joined with the identity of the account that submitted it.
///
/// Only handed to callers allowed to see rater identities for the store in
/// question.
#[derive(Debug, Clone)]
pub struct RatingWithRater {
    /// Unique rating ID.
    pub id: RatingId,
    /// Star value, 1–5.
    pub rating: RatingValue,
    /// Account that submitted the rating.
    pub user_id: UserId,
    /// The rater's full name.
    pub user_name: PersonName,
    /// The rater's email address.
    pub user_email: Email,
    /// When the rating was first submitted.
    pub created_at: DateTime<Utc>,
    /// When the value was last revised.
    pub updated_at: DateTime<Utc>,
}
