//! Plaintext password handling.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when parsing a [`Password`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PasswordError {
    /// The password length falls outside the accepted range.
    #[error("password must be between {min} and {max} characters")]
    Length {
        /// Minimum allowed length.
        min: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// The password contains no uppercase letter.
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    /// The password contains no special character.
    #[error("password must contain at least one special character")]
    MissingSpecial,
}

/// A plaintext password that satisfied the platform password policy.
///
/// The inner value lives in a [`SecretString`] so it is redacted from `Debug`
/// output and zeroized on drop. The plaintext leaves this type only through
/// [`Password::expose`], on its way into the password hasher.
///
/// ## Policy
///
/// - Length: 8-16 characters
/// - At least one uppercase ASCII letter
/// - At least one special character from `!@#$%^&*(),.?":{}|<>`
#[derive(Debug)]
pub struct Password(SecretString);

impl Password {
    /// Minimum accepted length in characters.
    pub const MIN_LENGTH: usize = 8;
    /// Maximum accepted length in characters.
    pub const MAX_LENGTH: usize = 16;
    /// Characters that satisfy the special-character requirement.
    pub const SPECIAL_CHARS: &'static str = "!@#$%^&*(),.?\":{}|<>";

    /// Parse a `Password` from a string, enforcing the password policy.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError`] if the input is outside 8-16 characters,
    /// lacks an uppercase letter, or lacks a special character.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        let count = s.chars().count();
        if count < Self::MIN_LENGTH || count > Self::MAX_LENGTH {
            return Err(PasswordError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        if !s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PasswordError::MissingUppercase);
        }

        if !s.chars().any(|c| Self::SPECIAL_CHARS.contains(c)) {
            return Err(PasswordError::MissingSpecial);
        }

        Ok(Self(SecretString::from(s.to_owned())))
    }

    /// The plaintext, for handing to the password hasher.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Password::parse("Abcdef1!").is_ok());
        assert!(Password::parse("P@ssword12345678").is_ok());
        assert!(Password::parse("Has{brace}9").is_ok());
    }

    #[test]
    fn test_parse_length() {
        // 7 characters
        assert!(matches!(
            Password::parse("Abcde1!"),
            Err(PasswordError::Length { min: 8, max: 16 })
        ));
        // 17 characters
        assert!(matches!(
            Password::parse("Abcdefghijklmno1!"),
            Err(PasswordError::Length { .. })
        ));
    }

    #[test]
    fn test_parse_missing_uppercase() {
        assert!(matches!(
            Password::parse("abcdef1!"),
            Err(PasswordError::MissingUppercase)
        ));
    }

    #[test]
    fn test_parse_missing_special() {
        assert!(matches!(
            Password::parse("Abcdefg1"),
            Err(PasswordError::MissingSpecial)
        ));
    }

    #[test]
    fn test_expose_returns_plaintext() {
        let password = Password::parse("Abcdef1!").unwrap();
        assert_eq!(password.expose(), "Abcdef1!");
    }

    #[test]
    fn test_debug_redacts() {
        let password = Password::parse("Abcdef1!").unwrap();
        let debug = format!("{password:?}");
        assert!(!debug.contains("Abcdef1!"));
    }
}
