//! Administration service.
//!
//! Account and store management plus the platform dashboard. Every entry
//! point here sits behind the admin route gate; the service enforces the
//! data rules (role strings, the owner-only store link, unique emails),
//! not who may call it.

use sqlx::SqlitePool;

use ratebook_core::{Address, Email, Password, PersonName, Role, StoreId, StoreName, UserId};

use super::ServiceError;
use super::auth::hash_password;
use crate::db::listing::{SortDirection, StoreFilter, StoreSortKey, UserFilter, UserSortKey};
use crate::db::stores::{NewStore, StoreChanges};
use crate::db::users::{NewUser, UserChanges};
use crate::db::{RatingRepository, RepositoryError, StoreRepository, UserRepository};
use crate::models::{OwnedStoreSummary, Store, StoreListing, User, UserWithStore};

/// Platform totals shown on the admin dashboard.
#[derive(Debug, Clone, Copy)]
pub struct DashboardStats {
    /// Accounts that are not administrators.
    pub total_users: i64,
    /// All stores.
    pub total_stores: i64,
    /// All ratings across all stores.
    pub total_ratings: i64,
}

/// Filters and ordering accepted by the admin account listing.
#[derive(Debug, Default)]
pub struct UserQuery<'a> {
    /// Substring filter on the name.
    pub name: Option<&'a str>,
    /// Substring filter on the email.
    pub email: Option<&'a str>,
    /// Substring filter on the address.
    pub address: Option<&'a str>,
    /// Exact role filter.
    pub role: Option<&'a str>,
    /// Requested sort key; unknown keys fall back to creation time.
    pub sort_by: Option<&'a str>,
    /// Requested direction; anything but `asc` means descending.
    pub sort_order: Option<&'a str>,
}

/// Filters and ordering accepted by the admin store listing.
#[derive(Debug, Default)]
pub struct AdminStoreQuery<'a> {
    /// Substring filter on the name.
    pub name: Option<&'a str>,
    /// Substring filter on the email.
    pub email: Option<&'a str>,
    /// Substring filter on the address.
    pub address: Option<&'a str>,
    /// Requested sort key; unknown keys fall back to creation time.
    pub sort_by: Option<&'a str>,
    /// Requested direction; anything but `asc` means descending.
    pub sort_order: Option<&'a str>,
}

/// Fields accepted when an admin creates an account.
#[derive(Debug)]
pub struct CreateUser<'a> {
    /// Full name.
    pub name: &'a str,
    /// Unique email address.
    pub email: &'a str,
    /// Plaintext password, validated against the password policy.
    pub password: &'a str,
    /// Postal address.
    pub address: &'a str,
    /// Role string: `admin`, `user`, or `owner`.
    pub role: &'a str,
    /// Owned store link; requires the owner role.
    pub store_id: Option<i64>,
}

/// Fields accepted when an admin updates an account.
///
/// `store_id` is three-state: absent leaves the link untouched, `Some(None)`
/// clears it, `Some(Some(id))` points it at a store.
#[derive(Debug, Default)]
pub struct UpdateUser<'a> {
    /// New full name.
    pub name: Option<&'a str>,
    /// New email address.
    pub email: Option<&'a str>,
    /// New postal address.
    pub address: Option<&'a str>,
    /// New role string.
    pub role: Option<&'a str>,
    /// New owned store link.
    pub store_id: Option<Option<i64>>,
}

/// Fields accepted when an admin creates a store.
#[derive(Debug)]
pub struct CreateStore<'a> {
    /// Display name.
    pub name: &'a str,
    /// Unique contact email.
    pub email: &'a str,
    /// Postal address.
    pub address: &'a str,
}

/// Fields accepted when an admin updates a store. Aggregates are not
/// writable through any admin path.
#[derive(Debug, Default)]
pub struct UpdateStore<'a> {
    /// New display name.
    pub name: Option<&'a str>,
    /// New contact email.
    pub email: Option<&'a str>,
    /// New postal address.
    pub address: Option<&'a str>,
}

/// Administration service.
pub struct AdminService<'a> {
    users: UserRepository<'a>,
    stores: StoreRepository<'a>,
    ratings: RatingRepository<'a>,
}

impl<'a> AdminService<'a> {
    /// Create a new administration service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
            stores: StoreRepository::new(pool),
            ratings: RatingRepository::new(pool),
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Platform totals: non-admin accounts, stores, ratings.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if any count fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, ServiceError> {
        let total_users = self.users.count_non_admin().await?;
        let total_stores = self.stores.count().await?;
        let total_ratings = self.ratings.count_all().await?;

        Ok(DashboardStats {
            total_users,
            total_stores,
            total_ratings,
        })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account with any role.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if a field fails validation, the
    /// role string is unknown, a store link is given without the owner role,
    /// or the linked store doesn't exist.
    /// Returns `ServiceError::Conflict` if the email is already registered.
    pub async fn create_user(&self, fields: &CreateUser<'_>) -> Result<User, ServiceError> {
        let name =
            PersonName::parse(fields.name).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let email =
            Email::parse(fields.email).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let address =
            Address::parse(fields.address).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let password =
            Password::parse(fields.password).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let role: Role = fields.role.parse().map_err(ServiceError::InvalidInput)?;
        let store_id = fields.store_id.map(StoreId::new);

        self.check_store_link(role, store_id).await?;

        let password_hash = hash_password(&password).await?;

        let user = self
            .users
            .create(&NewUser {
                name: &name,
                email: &email,
                password_hash: &password_hash,
                address: &address,
                role,
                store_id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ServiceError::Conflict(message),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created by admin");

        Ok(user)
    }

    /// Fetch one account with its owned-store summary.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the account doesn't exist.
    pub async fn get_user(&self, id: UserId) -> Result<UserWithStore, ServiceError> {
        let user = self
            .users
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("user not found"))?;

        let owned_store = match user.store_id {
            Some(store_id) => self.stores.get_by_id(store_id).await?.map(|store| {
                OwnedStoreSummary {
                    id: store.id,
                    name: store.name,
                    average_rating: store.average_rating,
                }
            }),
            None => None,
        };

        Ok(UserWithStore { user, owned_store })
    }

    /// Apply a partial update to an account.
    ///
    /// The owner-only store rule holds for the account as it will be after
    /// the update: demoting an owner that still has a store link requires
    /// clearing the link in the same request.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the account doesn't exist.
    /// Returns `ServiceError::InvalidInput` if a field fails validation or
    /// the resulting account would break the owner-only store rule.
    /// Returns `ServiceError::Conflict` if the email is already registered.
    pub async fn update_user(
        &self,
        id: UserId,
        fields: &UpdateUser<'_>,
    ) -> Result<User, ServiceError> {
        let current = self
            .users
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("user not found"))?;

        let name = fields
            .name
            .map(PersonName::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let email = fields
            .email
            .map(Email::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let address = fields
            .address
            .map(Address::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let role = fields
            .role
            .map(str::parse::<Role>)
            .transpose()
            .map_err(ServiceError::InvalidInput)?;
        let store_id = fields.store_id.map(|link| link.map(StoreId::new));

        let effective_role = role.unwrap_or(current.role);
        let effective_store = match store_id {
            Some(link) => link,
            None => current.store_id,
        };
        self.check_store_link(effective_role, effective_store)
            .await?;

        let updated = self
            .users
            .update(
                id,
                &UserChanges {
                    name: name.as_ref(),
                    email: email.as_ref(),
                    address: address.as_ref(),
                    role,
                    store_id,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ServiceError::Conflict(message),
                RepositoryError::NotFound => ServiceError::NotFound("user not found"),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(user_id = %updated.id, "Account updated by admin");

        Ok(updated)
    }

    /// List accounts with filters and sorting, each with its owned-store
    /// summary.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the role filter is unknown.
    pub async fn list_users(
        &self,
        query: &UserQuery<'_>,
    ) -> Result<Vec<UserWithStore>, ServiceError> {
        let role = query
            .role
            .map(str::parse::<Role>)
            .transpose()
            .map_err(ServiceError::InvalidInput)?;

        let filter = UserFilter {
            name: query.name,
            email: query.email,
            address: query.address,
            role,
        };
        let sort = UserSortKey::parse(query.sort_by);
        let direction = SortDirection::parse(query.sort_order);

        let users = self.users.list(&filter, sort, direction).await?;

        Ok(users)
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Create a store. Its aggregates start at zero.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if a field fails validation.
    /// Returns `ServiceError::Conflict` if the email is already used.
    pub async fn create_store(&self, fields: &CreateStore<'_>) -> Result<Store, ServiceError> {
        let name =
            StoreName::parse(fields.name).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let email =
            Email::parse(fields.email).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let address =
            Address::parse(fields.address).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let store = self
            .stores
            .create(&NewStore {
                name: &name,
                email: &email,
                address: &address,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ServiceError::Conflict(message),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(store_id = %store.id, "Store created");

        Ok(store)
    }

    /// Apply a partial update to a store's identity fields.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store doesn't exist.
    /// Returns `ServiceError::InvalidInput` if a field fails validation.
    /// Returns `ServiceError::Conflict` if the email is already used.
    pub async fn update_store(
        &self,
        id: StoreId,
        fields: &UpdateStore<'_>,
    ) -> Result<Store, ServiceError> {
        let name = fields
            .name
            .map(StoreName::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let email = fields
            .email
            .map(Email::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let address = fields
            .address
            .map(Address::parse)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let store = self
            .stores
            .update(
                id,
                &StoreChanges {
                    name: name.as_ref(),
                    email: email.as_ref(),
                    address: address.as_ref(),
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ServiceError::Conflict(message),
                RepositoryError::NotFound => ServiceError::NotFound("store not found"),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(store_id = %store.id, "Store updated");

        Ok(store)
    }

    /// List stores with filters and sorting. No own-rating annotation;
    /// admins don't rate stores.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_stores(
        &self,
        query: &AdminStoreQuery<'_>,
    ) -> Result<Vec<StoreListing>, ServiceError> {
        let filter = StoreFilter {
            name: query.name,
            email: query.email,
            address: query.address,
        };
        let sort = StoreSortKey::parse_admin(query.sort_by);
        let direction = SortDirection::parse(query.sort_order);

        let listings = self.stores.list(&filter, sort, direction, None).await?;

        Ok(listings)
    }

    /// Enforce the owner-only store rule and that a linked store exists.
    async fn check_store_link(
        &self,
        role: Role,
        store_id: Option<StoreId>,
    ) -> Result<(), ServiceError> {
        let Some(store_id) = store_id else {
            return Ok(());
        };

        if role != Role::Owner {
            return Err(ServiceError::InvalidInput(
                "store_id requires the owner role".to_owned(),
            ));
        }

        if self.stores.get_by_id(store_id).await?.is_none() {
            return Err(ServiceError::InvalidInput("store does not exist".to_owned()));
        }

        Ok(())
    }
}
