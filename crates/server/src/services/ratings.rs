//! Rating submission and revision.

use sqlx::SqlitePool;

use ratebook_core::{RatingId, RatingValue, StoreId};

use super::ServiceError;
use crate::db::{RatingRepository, RepositoryError, StoreRepository};
use crate::models::{Rating, User};

/// Service for submitting and revising ratings.
///
/// Both operations check the caller's capability before touching the ledger:
/// only the base user role submits ratings, and a rating is only ever revised
/// by the account that created it.
pub struct RatingService<'a> {
    ratings: RatingRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> RatingService<'a> {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            ratings: RatingRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Submit the caller's rating of a store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if the caller's role doesn't submit
    /// ratings.
    /// Returns `ServiceError::InvalidInput` if the value is out of range.
    /// Returns `ServiceError::NotFound` if the store doesn't exist.
    /// Returns `ServiceError::Conflict` if the caller already rated it.
    pub async fn submit(
        &self,
        caller: &User,
        store_id: StoreId,
        value: i64,
    ) -> Result<Rating, ServiceError> {
        if !caller.role.policy().can_submit_ratings {
            return Err(ServiceError::Forbidden("only users can submit ratings"));
        }

        let rating =
            RatingValue::new(value).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        self.stores
            .get_by_id(store_id)
            .await?
            .ok_or(ServiceError::NotFound("store not found"))?;

        let created = self
            .ratings
            .submit(caller.id, store_id, rating)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ServiceError::Conflict(message),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(
            user_id = %caller.id,
            store_id = %store_id,
            rating = %created.rating,
            "Rating submitted"
        );

        Ok(created)
    }

    /// Replace the value of a rating the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if the caller's role doesn't submit
    /// ratings or the rating belongs to another account.
    /// Returns `ServiceError::InvalidInput` if the value is out of range.
    /// Returns `ServiceError::NotFound` if the rating doesn't exist.
    pub async fn update(
        &self,
        caller: &User,
        rating_id: RatingId,
        value: i64,
    ) -> Result<Rating, ServiceError> {
        if !caller.role.policy().can_submit_ratings {
            return Err(ServiceError::Forbidden("only users can submit ratings"));
        }

        let rating =
            RatingValue::new(value).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let existing = self
            .ratings
            .get_by_id(rating_id)
            .await?
            .ok_or(ServiceError::NotFound("rating not found"))?;

        if existing.user_id != caller.id {
            return Err(ServiceError::Forbidden("rating belongs to another account"));
        }

        let updated = self.ratings.update_value(rating_id, rating).await?;

        tracing::info!(
            user_id = %caller.id,
            rating_id = %rating_id,
            rating = %updated.rating,
            "Rating updated"
        );

        Ok(updated)
    }
}
