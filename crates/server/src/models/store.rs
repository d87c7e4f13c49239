//! Store domain types.

use chrono::{DateTime, Utc};

use ratebook_core::{Address, AverageRating, Email, RatingId, RatingValue, StoreId, StoreName};

/// A store in the directory (domain type).
///
/// `average_rating` and `total_ratings` are caches over the rating ledger,
/// recomputed inside every ledger transaction. They are never writable on
/// their own.
#[derive(Debug, Clone)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Store name, 3–60 characters.
    pub name: StoreName,
    /// Unique contact email.
    pub email: Email,
    /// Postal address.
    pub address: Address,
    /// Mean of all ratings, rounded to hundredths; 0.00 with no ratings.
    pub average_rating: AverageRating,
    /// Number of ratings on the ledger for this store.
    pub total_ratings: i64,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The caller's own rating of a store, attached to listings for accounts
/// that submit ratings.
#[derive(Debug, Clone, Copy)]
pub struct OwnRating {
    /// ID of the caller's rating row.
    pub id: RatingId,
    /// The value the caller gave.
    pub rating: RatingValue,
}

/// A store as the authenticated listing returns it.
#[derive(Debug, Clone)]
pub struct StoreListing {
    /// The store itself.
    pub store: Store,
    /// The caller's own rating, when the listing was annotated for them.
    pub own_rating: Option<OwnRating>,
}

/// The slice of a store the admin user listing embeds next to its owner.
#[derive(Debug, Clone)]
pub struct OwnedStoreSummary {
    /// Store ID.
    pub id: StoreId,
    /// Store name.
    pub name: StoreName,
    /// Cached average rating.
    pub average_rating: AverageRating,
}
