//! Store repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqlitePool};

use ratebook_core::{Address, AverageRating, Email, RatingId, RatingValue, StoreId, StoreName, UserId};

use super::RepositoryError;
use super::listing::{SortDirection, StoreFilter, StoreSortKey, like_pattern};
use crate::models::{OwnRating, Store, StoreListing};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i64,
    name: String,
    email: String,
    address: String,
    average_rating: i64,
    total_ratings: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let name = StoreName::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid store name in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let address = Address::parse(&row.address).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid address in database: {e}"))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name,
            email,
            address,
            average_rating: AverageRating::from_hundredths(row.average_rating),
            total_ratings: row.total_ratings,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row type for listing queries: the store plus the caller's own rating from
/// the annotation join, when one matched.
#[derive(Debug, sqlx::FromRow)]
struct StoreListingRow {
    #[sqlx(flatten)]
    store: StoreRow,
    own_rating_id: Option<i64>,
    own_rating_value: Option<i64>,
}

impl TryFrom<StoreListingRow> for StoreListing {
    type Error = RepositoryError;

    fn try_from(row: StoreListingRow) -> Result<Self, Self::Error> {
        let store = Store::try_from(row.store)?;

        let own_rating = match (row.own_rating_id, row.own_rating_value) {
            (Some(id), Some(value)) => {
                let rating = RatingValue::new(value).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
                })?;
                Some(OwnRating {
                    id: RatingId::new(id),
                    rating,
                })
            }
            _ => None,
        };

        Ok(Self { store, own_rating })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Fields of a new store.
#[derive(Debug)]
pub struct NewStore<'a> {
    /// Display name.
    pub name: &'a StoreName,
    /// Unique contact email.
    pub email: &'a Email,
    /// Postal address.
    pub address: &'a Address,
}

/// Partial update of a store. `None` fields keep their current value.
#[derive(Debug, Default)]
pub struct StoreChanges<'a> {
    /// New display name.
    pub name: Option<&'a StoreName>,
    /// New contact email.
    pub email: Option<&'a Email>,
    /// New postal address.
    pub address: Option<&'a Address>,
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new store. Its aggregates start at zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_store: &NewStore<'_>) -> Result<Store, RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO stores (name, email, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING id, name, email, address, average_rating, total_ratings, created_at, updated_at
            ",
        )
        .bind(new_store.name.as_str())
        .bind(new_store.email.as_str())
        .bind(new_store.address.as_str())
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, email, address, average_rating, total_ratings, created_at, updated_at
            FROM stores
            WHERE id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Apply a partial update to a store. Aggregates are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email is already used by
    /// another store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: StoreId,
        changes: &StoreChanges<'_>,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            UPDATE stores
            SET name = COALESCE(?1, name),
                email = COALESCE(?2, email),
                address = COALESCE(?3, address),
                updated_at = ?4
            WHERE id = ?5
            RETURNING id, name, email, address, average_rating, total_ratings, created_at, updated_at
            ",
        )
        .bind(changes.name.map(StoreName::as_str))
        .bind(changes.email.map(Email::as_str))
        .bind(changes.address.map(Address::as_str))
        .bind(Utc::now())
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// List stores with filters and sorting.
    ///
    /// When `annotate_for` is set, each listing carries that account's own
    /// rating of the store, resolved in the same query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any row is invalid.
    pub async fn list(
        &self,
        filter: &StoreFilter<'_>,
        sort: StoreSortKey,
        direction: SortDirection,
        annotate_for: Option<UserId>,
    ) -> Result<Vec<StoreListing>, RepositoryError> {
        let mut qb = QueryBuilder::new(
            "SELECT s.id, s.name, s.email, s.address, s.average_rating, s.total_ratings, \
             s.created_at, s.updated_at, \
             r.id AS own_rating_id, r.rating AS own_rating_value \
             FROM stores s \
             LEFT JOIN ratings r ON r.store_id = s.id AND r.user_id = ",
        );
        qb.push_bind(annotate_for.map(|id| id.as_i64()));
        qb.push(" WHERE 1 = 1");

        if let Some(name) = filter.name {
            qb.push(" AND s.name LIKE ")
                .push_bind(like_pattern(name))
                .push(" ESCAPE '\\'");
        }
        if let Some(email) = filter.email {
            qb.push(" AND s.email LIKE ")
                .push_bind(like_pattern(email))
                .push(" ESCAPE '\\'");
        }
        if let Some(address) = filter.address {
            qb.push(" AND s.address LIKE ")
                .push_bind(like_pattern(address))
                .push(" ESCAPE '\\'");
        }

        qb.push(" ORDER BY s.")
            .push(sort.column())
            .push(" ")
            .push(direction.sql());

        let rows = qb
            .build_query_as::<StoreListingRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count all stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stores")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
