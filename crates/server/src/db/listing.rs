//! Sort and filter plumbing for the listing queries.
//!
//! Sort keys come from clients as free text, so each listing has a closed
//! enum of the columns it may order by; anything unrecognized silently falls
//! back to newest-first. Filter substrings are escaped before they are bound
//! into a `LIKE` pattern so user input cannot smuggle wildcards.

/// Direction of a listing sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Parse a `sort_order` parameter. Anything but a case-insensitive
    /// `asc` sorts descending.
    #[must_use]
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// The SQL keyword for this direction.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Columns the store listings may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSortKey {
    /// Store name.
    Name,
    /// Contact email (admin listing only).
    Email,
    /// Postal address.
    Address,
    /// Cached average rating.
    AverageRating,
    /// Creation time.
    CreatedAt,
}

impl StoreSortKey {
    /// Parse a `sort_by` parameter for the authenticated store listing.
    ///
    /// The public allow-list has no email column; unknown keys fall back to
    /// [`Self::CreatedAt`].
    #[must_use]
    pub fn parse_public(param: Option<&str>) -> Self {
        match param {
            Some("name") => Self::Name,
            Some("address") => Self::Address,
            Some("average_rating") => Self::AverageRating,
            _ => Self::CreatedAt,
        }
    }

    /// Parse a `sort_by` parameter for the admin store listing.
    #[must_use]
    pub fn parse_admin(param: Option<&str>) -> Self {
        match param {
            Some("email") => Self::Email,
            other => Self::parse_public(other),
        }
    }

    /// The `stores` column this key orders by.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::AverageRating => "average_rating",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Columns the admin user listing may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortKey {
    /// Account name.
    Name,
    /// Email address.
    Email,
    /// Postal address.
    Address,
    /// Account role.
    Role,
    /// Creation time.
    CreatedAt,
}

impl UserSortKey {
    /// Parse a `sort_by` parameter; unknown keys fall back to
    /// [`Self::CreatedAt`].
    #[must_use]
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            Some("name") => Self::Name,
            Some("email") => Self::Email,
            Some("address") => Self::Address,
            Some("role") => Self::Role,
            _ => Self::CreatedAt,
        }
    }

    /// The `users` column this key orders by.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Substring filters for the store listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreFilter<'a> {
    /// Substring match on the store name.
    pub name: Option<&'a str>,
    /// Substring match on the contact email (admin listing only).
    pub email: Option<&'a str>,
    /// Substring match on the address.
    pub address: Option<&'a str>,
}

/// Filters for the admin user listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter<'a> {
    /// Substring match on the account name.
    pub name: Option<&'a str>,
    /// Substring match on the email address.
    pub email: Option<&'a str>,
    /// Substring match on the postal address.
    pub address: Option<&'a str>,
    /// Exact match on the role.
    pub role: Option<ratebook_core::Role>,
}

/// Turn a raw substring into a `%...%` pattern for `LIKE ... ESCAPE '\'`.
///
/// `%`, `_` and the escape character itself are escaped so they match
/// literally.
#[must_use]
pub fn like_pattern(substring: &str) -> String {
    let mut pattern = String::with_capacity(substring.len() + 2);
    pattern.push('%');
    for c in substring.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("desc")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn test_store_sort_key_public_allow_list() {
        assert_eq!(StoreSortKey::parse_public(Some("name")), StoreSortKey::Name);
        assert_eq!(
            StoreSortKey::parse_public(Some("average_rating")),
            StoreSortKey::AverageRating
        );
        // Email is not sortable on the public listing.
        assert_eq!(
            StoreSortKey::parse_public(Some("email")),
            StoreSortKey::CreatedAt
        );
        assert_eq!(
            StoreSortKey::parse_public(Some("password_hash")),
            StoreSortKey::CreatedAt
        );
        assert_eq!(StoreSortKey::parse_public(None), StoreSortKey::CreatedAt);
    }

    #[test]
    fn test_store_sort_key_admin_allow_list() {
        assert_eq!(StoreSortKey::parse_admin(Some("email")), StoreSortKey::Email);
        assert_eq!(StoreSortKey::parse_admin(Some("name")), StoreSortKey::Name);
        assert_eq!(
            StoreSortKey::parse_admin(Some("id; DROP TABLE stores")),
            StoreSortKey::CreatedAt
        );
    }

    #[test]
    fn test_user_sort_key_allow_list() {
        assert_eq!(UserSortKey::parse(Some("role")), UserSortKey::Role);
        assert_eq!(UserSortKey::parse(Some("created_at")), UserSortKey::CreatedAt);
        assert_eq!(UserSortKey::parse(Some("store_id")), UserSortKey::CreatedAt);
        assert_eq!(UserSortKey::parse(None), UserSortKey::CreatedAt);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("plain"), "%plain%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
