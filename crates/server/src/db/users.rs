//! Account repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqlitePool};

use ratebook_core::{Address, AverageRating, Email, PersonName, Role, StoreId, StoreName, UserId};

use super::RepositoryError;
use super::listing::{SortDirection, UserFilter, UserSortKey, like_pattern};
use crate::models::{OwnedStoreSummary, User, UserWithStore};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for account queries. Shared with the token repository,
/// which resolves tokens straight to accounts.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: i64,
    name: String,
    email: String,
    address: String,
    role: Role,
    store_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let name = PersonName::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid name in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let address = Address::parse(&row.address).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid address in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name,
            email,
            address,
            role: row.role,
            store_id: row.store_id.map(StoreId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row type for the login lookup: the account plus its password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserAuthRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Row type for the admin listing: the account plus its owned-store summary.
#[derive(Debug, sqlx::FromRow)]
struct UserWithStoreRow {
    #[sqlx(flatten)]
    user: UserRow,
    store_name: Option<String>,
    store_average_rating: Option<i64>,
}

impl TryFrom<UserWithStoreRow> for UserWithStore {
    type Error = RepositoryError;

    fn try_from(row: UserWithStoreRow) -> Result<Self, Self::Error> {
        let user = User::try_from(row.user)?;

        let owned_store = match (user.store_id, row.store_name, row.store_average_rating) {
            (Some(id), Some(name), Some(average)) => {
                let name = StoreName::parse(&name).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid store name in database: {e}"))
                })?;
                Some(OwnedStoreSummary {
                    id,
                    name,
                    average_rating: AverageRating::from_hundredths(average),
                })
            }
            _ => None,
        };

        Ok(Self { user, owned_store })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Fields of a new account.
#[derive(Debug)]
pub struct NewUser<'a> {
    /// Full name.
    pub name: &'a PersonName,
    /// Unique email address.
    pub email: &'a Email,
    /// Argon2id PHC string, never the plaintext.
    pub password_hash: &'a str,
    /// Postal address.
    pub address: &'a Address,
    /// Role the account starts with.
    pub role: Role,
    /// Owned store, only meaningful for the owner role.
    pub store_id: Option<StoreId>,
}

/// Partial update of an account.
///
/// `store_id` is three-state: `None` leaves the link untouched, `Some(None)`
/// clears it, `Some(Some(id))` points it at a store.
#[derive(Debug, Default)]
pub struct UserChanges<'a> {
    /// New full name.
    pub name: Option<&'a PersonName>,
    /// New email address.
    pub email: Option<&'a Email>,
    /// New postal address.
    pub address: Option<&'a Address>,
    /// New role.
    pub role: Option<Role>,
    /// New owned-store link.
    pub store_id: Option<Option<StoreId>>,
}

/// Repository for account database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser<'_>) -> Result<User, RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (name, email, password_hash, address, role, store_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING id, name, email, address, role, store_id, created_at, updated_at
            ",
        )
        .bind(new_user.name.as_str())
        .bind(new_user.email.as_str())
        .bind(new_user.password_hash)
        .bind(new_user.address.as_str())
        .bind(new_user.role)
        .bind(new_user.store_id.map(|id| id.as_i64()))
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

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, address, role, store_id, created_at, updated_at
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account by its email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, address, role, store_id, created_at, updated_at
            FROM users
            WHERE email = ?1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an account and its password hash by email, for credential checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserAuthRow>(
            r"
            SELECT id, name, email, password_hash, address, role, store_id, created_at, updated_at
            FROM users
            WHERE email = ?1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Get the password hash for an account ID, for password rotation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            r"
            SELECT password_hash
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(hash)
    }

    /// Replace an account's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = ?1, updated_at = ?2
            WHERE id = ?3
            ",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Apply a partial update to an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email is already used by
    /// another account.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: UserId,
        changes: &UserChanges<'_>,
    ) -> Result<User, RepositoryError> {
        let mut qb = QueryBuilder::new("UPDATE users SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = changes.name {
            qb.push(", name = ").push_bind(name.as_str());
        }
        if let Some(email) = changes.email {
            qb.push(", email = ").push_bind(email.as_str());
        }
        if let Some(address) = changes.address {
            qb.push(", address = ").push_bind(address.as_str());
        }
        if let Some(role) = changes.role {
            qb.push(", role = ").push_bind(role);
        }
        if let Some(store_id) = changes.store_id {
            qb.push(", store_id = ").push_bind(store_id.map(|id| id.as_i64()));
        }

        qb.push(" WHERE id = ").push_bind(id.as_i64());
        qb.push(" RETURNING id, name, email, address, role, store_id, created_at, updated_at");

        let row = qb
            .build_query_as::<UserRow>()
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

    /// List accounts with filters and sorting, each with its owned-store
    /// summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any row is invalid.
    pub async fn list(
        &self,
        filter: &UserFilter<'_>,
        sort: UserSortKey,
        direction: SortDirection,
    ) -> Result<Vec<UserWithStore>, RepositoryError> {
        let mut qb = QueryBuilder::new(
            "SELECT u.id, u.name, u.email, u.address, u.role, u.store_id, \
             u.created_at, u.updated_at, \
             s.name AS store_name, s.average_rating AS store_average_rating \
             FROM users u \
             LEFT JOIN stores s ON s.id = u.store_id \
             WHERE 1 = 1",
        );

        if let Some(name) = filter.name {
            qb.push(" AND u.name LIKE ")
                .push_bind(like_pattern(name))
                .push(" ESCAPE '\\'");
        }
        if let Some(email) = filter.email {
            qb.push(" AND u.email LIKE ")
                .push_bind(like_pattern(email))
                .push(" ESCAPE '\\'");
        }
        if let Some(address) = filter.address {
            qb.push(" AND u.address LIKE ")
                .push_bind(like_pattern(address))
                .push(" ESCAPE '\\'");
        }
        if let Some(role) = filter.role {
            qb.push(" AND u.role = ").push_bind(role);
        }

        qb.push(" ORDER BY u.")
            .push(sort.column())
            .push(" ")
            .push(direction.sql());

        let rows = qb
            .build_query_as::<UserWithStoreRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count accounts that are not administrators.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_non_admin(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM users
            WHERE role <> ?1
            ",
        )
        .bind(Role::Admin)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
