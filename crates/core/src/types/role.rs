//! Account roles and the capabilities attached to them.

use serde::{Deserialize, Serialize};

/// Account role with different permission levels.
///
/// Every account carries exactly one role. New registrations always start as
/// [`Role::User`]; the other roles are assigned by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to user and store management plus platform dashboards.
    Admin,
    /// Can browse stores and submit ratings.
    #[default]
    User,
    /// Can view the ratings submitted against their own store.
    Owner,
}

impl Role {
    /// The set of capabilities this role grants.
    ///
    /// Data-access decisions are made against the returned [`RolePolicy`]
    /// rather than by matching on the role at each call site. Adding a role
    /// means adding one arm here rather than auditing every access check in
    /// the codebase.
    #[must_use]
    pub const fn policy(self) -> RolePolicy {
        match self {
            Self::Admin => RolePolicy {
                annotate_own_rating: false,
                can_submit_ratings: false,
                can_manage_directory: true,
                sees_all_rater_identity: true,
            },
            Self::User => RolePolicy {
                annotate_own_rating: true,
                can_submit_ratings: true,
                can_manage_directory: false,
                sees_all_rater_identity: false,
            },
            Self::Owner => RolePolicy {
                annotate_own_rating: false,
                can_submit_ratings: false,
                can_manage_directory: false,
                sees_all_rater_identity: false,
            },
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "owner" => Ok(Self::Owner),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Capabilities granted by a [`Role`].
///
/// Each flag answers one authorization question the HTTP layer asks. Owners
/// carry no flag for viewing their own store's raters: that check is scoped
/// to the store they are linked to, not to the role alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    /// Store listings include the caller's own rating per store.
    pub annotate_own_rating: bool,
    /// May submit and revise ratings against stores.
    pub can_submit_ratings: bool,
    /// May create and modify accounts and stores, and view platform
    /// dashboards.
    pub can_manage_directory: bool,
    /// Sees rater name/email on every store, not only an owned one.
    pub sees_all_rater_identity: bool,
}
