//! Rating repository for database operations.
//!
//! Submitting or revising a rating and refreshing the store's aggregates
//! happen in one transaction, so readers never observe an aggregate that
//! disagrees with the rating rows.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use ratebook_core::{AverageRating, Email, PersonName, RatingId, RatingValue, StoreId, UserId};

use super::RepositoryError;
use crate::models::{Rating, RatingWithRater};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for rating queries.
#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: i64,
    user_id: i64,
    store_id: i64,
    rating: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let rating = RatingValue::new(row.rating).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;

        Ok(Self {
            id: RatingId::new(row.id),
            user_id: UserId::new(row.user_id),
            store_id: StoreId::new(row.store_id),
            rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row type for rating listings that include the rater's identity.
#[derive(Debug, sqlx::FromRow)]
struct RatingWithRaterRow {
    id: i64,
    rating: i64,
    user_id: i64,
    user_name: String,
    user_email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingWithRaterRow> for RatingWithRater {
    type Error = RepositoryError;

    fn try_from(row: RatingWithRaterRow) -> Result<Self, Self::Error> {
        let rating = RatingValue::new(row.rating).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;
        let user_name = PersonName::parse(&row.user_name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid name in database: {e}"))
        })?;
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: RatingId::new(row.id),
            rating,
            user_id: UserId::new(row.user_id),
            user_name,
            user_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Aggregate Maintenance
// =============================================================================

/// Recompute a store's aggregates from its rating rows.
///
/// Runs on the caller's connection so it joins whatever transaction the
/// caller has open. Derives everything from the ratings table, so running it
/// twice in a row changes nothing.
async fn recompute_aggregate(
    conn: &mut SqliteConnection,
    store_id: StoreId,
) -> Result<(), RepositoryError> {
    let (count, sum) = sqlx::query_as::<_, (i64, Option<i64>)>(
        r"
        SELECT COUNT(*), SUM(rating)
        FROM ratings
        WHERE store_id = ?1
        ",
    )
    .bind(store_id.as_i64())
    .fetch_one(&mut *conn)
    .await?;

    let average = AverageRating::from_sum_count(sum.unwrap_or(0), count);

    let result = sqlx::query(
        r"
        UPDATE stores
        SET average_rating = ?1, total_ratings = ?2, updated_at = ?3
        WHERE id = ?4
        ",
    )
    .bind(average.as_hundredths())
    .bind(count)
    .bind(Utc::now())
    .bind(store_id.as_i64())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a rating by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: RatingId) -> Result<Option<Rating>, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            SELECT id, user_id, store_id, rating, created_at, updated_at
            FROM ratings
            WHERE id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Record an account's rating of a store and refresh the store's
    /// aggregates, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the account has already rated
    /// this store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn submit(
        &self,
        user_id: UserId,
        store_id: StoreId,
        rating: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, RatingRow>(
            r"
            INSERT INTO ratings (user_id, store_id, rating, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING id, user_id, store_id, rating, created_at, updated_at
            ",
        )
        .bind(user_id.as_i64())
        .bind(store_id.as_i64())
        .bind(rating.as_i64())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("store already rated".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        recompute_aggregate(&mut tx, store_id).await?;
        tx.commit().await?;

        row.try_into()
    }

    /// Replace the value of an existing rating and refresh the store's
    /// aggregates, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the rating doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_value(
        &self,
        id: RatingId,
        rating: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RatingRow>(
            r"
            UPDATE ratings
            SET rating = ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING id, user_id, store_id, rating, created_at, updated_at
            ",
        )
        .bind(rating.as_i64())
        .bind(Utc::now())
        .bind(id.as_i64())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        recompute_aggregate(&mut tx, StoreId::new(row.store_id)).await?;
        tx.commit().await?;

        row.try_into()
    }

    /// List a store's ratings with each rater's identity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any row is invalid.
    pub async fn list_for_store_with_raters(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithRater>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingWithRaterRow>(
            r"
            SELECT r.id, r.rating, r.user_id, u.name AS user_name, u.email AS user_email,
                   r.created_at, r.updated_at
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.store_id = ?1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(store_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count all ratings across all stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::stores::{NewStore, StoreRepository};
    use crate::db::users::{NewUser, UserRepository};
    use crate::db::connect_in_memory;
    use ratebook_core::{Address, Role, StoreName};

    async fn seed_user(pool: &SqlitePool, name: &str, email: &str) -> UserId {
        let name = PersonName::parse(name).unwrap();
        let email = Email::parse(email).unwrap();
        let address = Address::parse("12 Fixture Street, Test City").unwrap();

        UserRepository::new(pool)
            .create(&NewUser {
                name: &name,
                email: &email,
                password_hash: "unused-hash",
                address: &address,
                role: Role::User,
                store_id: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_store(pool: &SqlitePool) -> StoreId {
        let name = StoreName::parse("Aggregate Fixture Store").unwrap();
        let email = Email::parse("store@fixture.test").unwrap();
        let address = Address::parse("34 Fixture Avenue, Test City").unwrap();

        StoreRepository::new(pool)
            .create(&NewStore {
                name: &name,
                email: &email,
                address: &address,
            })
            .await
            .unwrap()
            .id
    }

    async fn aggregates(pool: &SqlitePool, store_id: StoreId) -> (i64, i64) {
        let store = StoreRepository::new(pool)
            .get_by_id(store_id)
            .await
            .unwrap()
            .unwrap();
        (store.average_rating.as_hundredths(), store.total_ratings)
    }

    #[tokio::test]
    async fn test_submit_refreshes_aggregates() {
        let pool = connect_in_memory().await.unwrap();
        let alice = seed_user(&pool, "Alice Fixture Rater Account", "alice@fixture.test").await;
        let bob = seed_user(&pool, "Robert Fixture Rater Account", "bob@fixture.test").await;
        let store = seed_store(&pool).await;

        let repo = RatingRepository::new(&pool);
        repo.submit(alice, store, RatingValue::new(5).unwrap())
            .await
            .unwrap();
        repo.submit(bob, store, RatingValue::new(4).unwrap())
            .await
            .unwrap();

        // (5 + 4) / 2 = 4.50
        assert_eq!(aggregates(&pool, store).await, (450, 2));
    }

    #[tokio::test]
    async fn test_duplicate_submit_conflicts_and_leaves_aggregates() {
        let pool = connect_in_memory().await.unwrap();
        let alice = seed_user(&pool, "Alice Fixture Rater Account", "alice@fixture.test").await;
        let store = seed_store(&pool).await;

        let repo = RatingRepository::new(&pool);
        repo.submit(alice, store, RatingValue::new(5).unwrap())
            .await
            .unwrap();

        let err = repo
            .submit(alice, store, RatingValue::new(1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        assert_eq!(aggregates(&pool, store).await, (500, 1));
    }

    #[tokio::test]
    async fn test_update_value_recomputes() {
        let pool = connect_in_memory().await.unwrap();
        let alice = seed_user(&pool, "Alice Fixture Rater Account", "alice@fixture.test").await;
        let store = seed_store(&pool).await;

        let repo = RatingRepository::new(&pool);
        let rating = repo
            .submit(alice, store, RatingValue::new(5).unwrap())
            .await
            .unwrap();

        let updated = repo
            .update_value(rating.id, RatingValue::new(2).unwrap())
            .await
            .unwrap();
        assert_eq!(updated.rating.as_i64(), 2);

        assert_eq!(aggregates(&pool, store).await, (200, 1));
    }

    #[tokio::test]
    async fn test_update_missing_rating_not_found() {
        let pool = connect_in_memory().await.unwrap();

        let err = RatingRepository::new(&pool)
            .update_value(RatingId::new(999), RatingValue::new(3).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        let alice = seed_user(&pool, "Alice Fixture Rater Account", "alice@fixture.test").await;
        let bob = seed_user(&pool, "Robert Fixture Rater Account", "bob@fixture.test").await;
        let store = seed_store(&pool).await;

        let repo = RatingRepository::new(&pool);
        repo.submit(alice, store, RatingValue::new(2).unwrap())
            .await
            .unwrap();
        repo.submit(bob, store, RatingValue::new(3).unwrap())
            .await
            .unwrap();

        let before = aggregates(&pool, store).await;

        let mut conn = pool.acquire().await.unwrap();
        recompute_aggregate(&mut conn, store).await.unwrap();
        drop(conn);

        assert_eq!(aggregates(&pool, store).await, before);
    }

    #[tokio::test]
    async fn test_list_with_raters_newest_first() {
        let pool = connect_in_memory().await.unwrap();
        let alice = seed_user(&pool, "Alice Fixture Rater Account", "alice@fixture.test").await;
        let bob = seed_user(&pool, "Robert Fixture Rater Account", "bob@fixture.test").await;
        let store = seed_store(&pool).await;

        let repo = RatingRepository::new(&pool);
        repo.submit(alice, store, RatingValue::new(5).unwrap())
            .await
            .unwrap();
        // Keep the two timestamps distinct so the ordering is unambiguous.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.submit(bob, store, RatingValue::new(4).unwrap())
            .await
            .unwrap();

        let raters = repo.list_for_store_with_raters(store).await.unwrap();
        assert_eq!(raters.len(), 2);
        assert!(raters[0].created_at >= raters[1].created_at);
        assert_eq!(raters[0].user_email.as_str(), "bob@fixture.test");
    }
}
