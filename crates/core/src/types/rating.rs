//! Rating values and aggregate rating math.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`RatingValue`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum RatingValueError {
    /// The value falls outside the accepted range.
    #[error("rating must be between {min} and {max}")]
    OutOfRange {
        /// Minimum accepted rating.
        min: i64,
        /// Maximum accepted rating.
        max: i64,
    },
}

/// A single rating submitted against a store.
///
/// Ratings are whole numbers from 1 (worst) to 5 (best). Fractional or
/// out-of-range values are rejected at parse time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RatingValue(i64);

impl RatingValue {
    /// Lowest accepted rating.
    pub const MIN: i64 = 1;
    /// Highest accepted rating.
    pub const MAX: i64 = 5;

    /// Parse a `RatingValue` from a raw integer.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValueError::OutOfRange`] if the value is not within
    /// 1 to 5 inclusive.
    pub const fn new(value: i64) -> Result<Self, RatingValueError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(RatingValueError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Get the underlying integer value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SQLx support (with sqlite feature)
#[cfg(feature = "sqlite")]
impl sqlx::Type<sqlx::Sqlite> for RatingValue {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlite")]
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for RatingValue {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        // The ratings table carries a CHECK constraint on the range
        Self::new(raw).map_err(Into::into)
    }
}

#[cfg(feature = "sqlite")]
impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for RatingValue {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<'q, sqlx::Sqlite>>::encode_by_ref(&self.0, buf)
    }
}

/// A store's average rating, rounded to two decimal places.
///
/// Stored internally in hundredths so the persisted value and the arithmetic
/// stay exact integers. A store with three ratings summing to 5 averages
/// 1.666..., which rounds (half away from zero) to `1.67` and is held here as
/// `167`.
///
/// Serializes as a two-decimal string, e.g. `"1.67"` or `"0.00"` for a store
/// with no ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AverageRating(i64);

impl AverageRating {
    /// The average shown for a store nobody has rated yet.
    pub const ZERO: Self = Self(0);

    /// Build from a value already expressed in hundredths.
    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// The underlying value in hundredths.
    #[must_use]
    pub const fn as_hundredths(&self) -> i64 {
        self.0
    }

    /// Recompute an average from a rating sum and count.
    ///
    /// Rounds half away from zero at the second decimal place. A count of
    /// zero yields [`AverageRating::ZERO`].
    #[must_use]
    pub const fn from_sum_count(sum: i64, count: i64) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self((200 * sum + count) / (2 * count))
    }

    /// The average as an exact decimal with two fractional digits.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

impl Serialize for AverageRating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Serialize::serialize(&self.as_decimal(), serializer)
    }
}
