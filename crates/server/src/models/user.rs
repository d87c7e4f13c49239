//! Account domain types.

use chrono::{DateTime, Utc};

use ratebook_core::{Address, Email, PersonName, Role, StoreId, UserId};

use super::store::OwnedStoreSummary;

/// A registered account (domain type).
///
/// The password hash never travels with this type; repositories hand it out
/// separately to the auth service only.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique account ID.
    pub id: UserId,
    /// Full name, 20–60 characters.
    pub name: PersonName,
    /// Unique email address.
    pub email: Email,
    /// Postal address.
    pub address: Address,
    /// Role deciding what this account may see and do.
    pub role: Role,
    /// The store this account owns, if the role is owner.
    pub store_id: Option<StoreId>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An account joined with a summary of its owned store, as the admin user
/// listing returns it.
#[derive(Debug, Clone)]
pub struct UserWithStore {
    /// The account itself.
    pub user: User,
    /// Summary of the owned store, if the account is linked to one.
    pub owned_store: Option<OwnedStoreSummary>,
}
