//! Length-bounded text fields.
//!
//! User-supplied free text (names, addresses) is validated once at the edge
//! and carried as one of these wrappers afterwards. Lengths are counted in
//! characters, not bytes.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a bounded text field.
#[derive(thiserror::Error, Debug, Clone)]
pub enum TextError {
    /// The input is shorter than the field allows.
    #[error("{field} must be at least {min} characters")]
    TooShort {
        /// Name of the offending field.
        field: &'static str,
        /// Minimum allowed length.
        min: usize,
    },
    /// The input is longer than the field allows.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

/// Macro to define a length-bounded text wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `parse()` enforcing character-count bounds
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Display`, `FromStr`, and `AsRef<str>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `sqlite` feature)
macro_rules! define_bounded_text {
    ($(#[$docs:meta])* $name:ident, $field:literal, $min:expr, $max:expr) => {
        $(#[$docs])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Minimum accepted length in characters.
            pub const MIN_LENGTH: usize = $min;
            /// Maximum accepted length in characters.
            pub const MAX_LENGTH: usize = $max;

            /// Parse from a string, enforcing the length bounds.
            ///
            /// # Errors
            ///
            /// Returns [`TextError`] if the character count falls outside
            /// `MIN_LENGTH..=MAX_LENGTH`.
            pub fn parse(s: &str) -> Result<Self, TextError> {
                let count = s.chars().count();
                if count < Self::MIN_LENGTH {
                    return Err(TextError::TooShort {
                        field: $field,
                        min: Self::MIN_LENGTH,
                    });
                }
                if count > Self::MAX_LENGTH {
                    return Err(TextError::TooLong {
                        field: $field,
                        max: Self::MAX_LENGTH,
                    });
                }
                Ok(Self(s.to_owned()))
            }

            /// Returns the value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = TextError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "sqlite")]
        impl ::sqlx::Type<::sqlx::Sqlite> for $name {
            fn type_info() -> ::sqlx::sqlite::SqliteTypeInfo {
                <String as ::sqlx::Type<::sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &::sqlx::sqlite::SqliteTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Sqlite>>::compatible(ty)
            }
        }

        #[cfg(feature = "sqlite")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Sqlite> for $name {
            fn decode(
                value: ::sqlx::sqlite::SqliteValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Sqlite>>::decode(value)?;
                // Database values are assumed valid
                Ok(Self(s))
            }
        }

        #[cfg(feature = "sqlite")]
        impl<'q> ::sqlx::Encode<'q, ::sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::std::vec::Vec<::sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<'q, ::sqlx::Sqlite>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_bounded_text!(
    /// A person's full name as shown on their account.
    ///
    /// Deliberately long-form: the platform asks for full legal names, hence
    /// the unusually high minimum.
    PersonName,
    "name",
    20,
    60
);

define_bounded_text!(
    /// A store's display name.
    StoreName,
    "name",
    3,
    60
);

define_bounded_text!(
    /// A postal address for an account or store.
    Address,
    "address",
    1,
    400
);
