//! Store browsing for every role, plus the owner's view of their own store.

use sqlx::SqlitePool;

use ratebook_core::StoreId;

use super::ServiceError;
use crate::db::listing::{SortDirection, StoreFilter, StoreSortKey};
use crate::db::{RatingRepository, StoreRepository};
use crate::models::{RatingWithRater, Store, StoreListing, User};

/// Filters and ordering accepted by the store listing.
#[derive(Debug, Default)]
pub struct StoreQuery<'a> {
    /// Substring filter on the store name.
    pub name: Option<&'a str>,
    /// Substring filter on the address.
    pub address: Option<&'a str>,
    /// Requested sort key; unknown keys fall back to creation time.
    pub sort_by: Option<&'a str>,
    /// Requested direction; anything but `asc` means descending.
    pub sort_order: Option<&'a str>,
}

/// A store plus the ratings the caller is allowed to see.
#[derive(Debug)]
pub struct StoreDetail {
    /// The store and its aggregates.
    pub store: Store,
    /// Per-rating list with rater identity, present only when the caller may
    /// see who rated this store.
    pub ratings: Option<Vec<RatingWithRater>>,
}

/// Everything the owner view returns for the caller's own store.
#[derive(Debug)]
pub struct OwnerDashboard {
    /// The owned store and its aggregates.
    pub store: Store,
    /// All ratings of the store with rater identity, newest first.
    pub ratings: Vec<RatingWithRater>,
}

/// Service for browsing the store directory.
pub struct DirectoryService<'a> {
    stores: StoreRepository<'a>,
    ratings: RatingRepository<'a>,
}

impl<'a> DirectoryService<'a> {
    /// Create a new directory service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
            ratings: RatingRepository::new(pool),
        }
    }

    /// List stores for any authenticated caller.
    ///
    /// Listings carry the caller's own rating per store when their role rates
    /// stores, so clients can render "your rating" without extra requests.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_stores(
        &self,
        caller: &User,
        query: &StoreQuery<'_>,
    ) -> Result<Vec<StoreListing>, ServiceError> {
        let filter = StoreFilter {
            name: query.name,
            email: None,
            address: query.address,
        };
        let sort = StoreSortKey::parse_public(query.sort_by);
        let direction = SortDirection::parse(query.sort_order);

        let annotate_for = caller
            .role
            .policy()
            .annotate_own_rating
            .then_some(caller.id);

        let listings = self
            .stores
            .list(&filter, sort, direction, annotate_for)
            .await?;

        Ok(listings)
    }

    /// Fetch one store, with its rating list when the caller may see raters.
    ///
    /// Rater identities are visible to admins everywhere and to the owner of
    /// this particular store; everyone else gets the aggregate only.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist.
    pub async fn store_detail(
        &self,
        caller: &User,
        store_id: StoreId,
    ) -> Result<StoreDetail, ServiceError> {
        let store = self
            .stores
            .get_by_id(store_id)
            .await?
            .ok_or(ServiceError::NotFound("store not found"))?;

        let sees_raters = caller.role.policy().sees_all_rater_identity
            || caller.store_id == Some(store_id);

        let ratings = if sees_raters {
            Some(self.ratings.list_for_store_with_raters(store_id).await?)
        } else {
            None
        };

        Ok(StoreDetail { store, ratings })
    }

    /// The owner view: the caller's own store and everyone who rated it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidState` if the account has no associated
    /// store.
    /// Returns `ServiceError::NotFound` if the associated store is missing.
    pub async fn owner_dashboard(&self, caller: &User) -> Result<OwnerDashboard, ServiceError> {
        let store_id = caller
            .store_id
            .ok_or(ServiceError::InvalidState("no store associated with this account"))?;

        let store = self
            .stores
            .get_by_id(store_id)
            .await?
            .ok_or(ServiceError::NotFound("store not found"))?;

        let ratings = self.ratings.list_for_store_with_raters(store_id).await?;

        Ok(OwnerDashboard { store, ratings })
    }
}
