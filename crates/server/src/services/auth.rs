//! Authentication service.
//!
//! Registration, login, logout, and password rotation. Session tokens are
//! random 256-bit values handed to the client once; the database only ever
//! sees their SHA-256 digest, so a leaked database cannot be replayed as a
//! session.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::Duration;

use ratebook_core::{Address, Email, Password, PersonName, Role, UserId};

use super::ServiceError;
use crate::db::users::NewUser;
use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::User;

/// Number of random bytes behind a session token.
const TOKEN_BYTES: usize = 32;

/// Well-formed hash to verify against when the login email is unknown, so
/// both failure paths cost one argon2 verification. The result is discarded.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// An authenticated session: the account and the opaque token that proves it.
///
/// The token appears here and in the issuing response, nowhere else.
#[derive(Debug)]
pub struct Session {
    /// Opaque bearer token for the `Authorization` header.
    pub token: String,
    /// The account the session belongs to.
    pub user: User,
}

/// Authentication service.
///
/// Handles registration, credential checks, and session token lifecycle.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, token_ttl: Duration) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            token_ttl,
        }
    }

    /// Register a new account and open its first session.
    ///
    /// Self-registration always produces the base user role.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if any field fails validation.
    /// Returns `ServiceError::Conflict` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        address: &str,
    ) -> Result<Session, ServiceError> {
        let name = PersonName::parse(name).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let email = Email::parse(email).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let address =
            Address::parse(address).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let password =
            Password::parse(password).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let password_hash = hash_password(&password).await?;

        let user = self
            .users
            .create(&NewUser {
                name: &name,
                email: &email,
                password_hash: &password_hash,
                address: &address,
                role: Role::User,
                store_id: None,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) => ServiceError::Conflict(message),
                other => ServiceError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Account registered");

        self.issue_session(user).await
    }

    /// Check credentials and open a session.
    ///
    /// An unknown email and a wrong password produce the same error, and the
    /// unknown-email path still runs a full verification, so neither the
    /// response nor its timing reveals which emails are registered.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the email format is invalid.
    /// Returns `ServiceError::Unauthorized` if the credentials don't match.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let email = Email::parse(email).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        match self.users.get_password_hash(&email).await? {
            Some((user, password_hash)) => {
                verify_password(password, &password_hash).await?;
                self.issue_session(user).await
            }
            None => {
                let _ = verify_password(password, DUMMY_PASSWORD_HASH).await;
                Err(ServiceError::Unauthorized("invalid credentials"))
            }
        }
    }

    /// Close the session behind a token digest.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the revocation fails.
    pub async fn logout(&self, token_hash: &str) -> Result<(), ServiceError> {
        self.tokens.revoke(token_hash).await?;
        Ok(())
    }

    /// Rotate an account's password after re-checking the current one.
    ///
    /// Every open session is revoked, the caller's included; clients log in
    /// again with the new password.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the new password fails the
    /// password policy.
    /// Returns `ServiceError::Unauthorized` if the current password is wrong.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let new_password =
            Password::parse(new_password).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let stored_hash = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("account not found"))?;

        verify_password(current_password, &stored_hash)
            .await
            .map_err(|_| ServiceError::Unauthorized("current password is incorrect"))?;

        let new_hash = hash_password(&new_password).await?;
        self.users.update_password(user_id, &new_hash).await?;

        let revoked = self.tokens.revoke_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Password rotated, sessions revoked");

        Ok(())
    }

    /// Issue a fresh session token for an account.
    async fn issue_session(&self, user: User) -> Result<Session, ServiceError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.token_ttl;

        self.tokens
            .create(user.id, &hash_token(&token), expires_at)
            .await?;

        Ok(Session { token, user })
    }
}

/// Generate a fresh opaque session token.
fn generate_token() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a session token the way it is stored and looked up.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Hash a password using Argon2id.
///
/// The hash runs on the blocking pool; argon2 is CPU-bound and would stall
/// the async worker otherwise.
pub(crate) async fn hash_password(password: &Password) -> Result<String, ServiceError> {
    let password = password.expose().to_owned();
    tokio::task::spawn_blocking(move || hash_password_sync(&password))
        .await
        .map_err(|_| ServiceError::PasswordHash)?
}

/// Verify a password against a stored hash, on the blocking pool.
async fn verify_password(password: &str, hash: &str) -> Result<(), ServiceError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || verify_password_sync(&password, &hash))
        .await
        .map_err(|_| ServiceError::PasswordHash)?
}

fn hash_password_sync(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::PasswordHash)
}

fn verify_password_sync(password: &str, hash: &str) -> Result<(), ServiceError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| ServiceError::Unauthorized("invalid credentials"))?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ServiceError::Unauthorized("invalid credentials"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password_sync("Abcdef1!").unwrap();

        assert!(verify_password_sync("Abcdef1!", &hash).is_ok());
        assert!(verify_password_sync("Wrong1!x", &hash).is_err());
    }

    #[test]
    fn test_dummy_hash_is_well_formed() {
        assert!(PasswordHash::new(DUMMY_PASSWORD_HASH).is_ok());
    }

    #[test]
    fn test_token_digest_is_stable_and_opaque() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        // 32 bytes of SHA-256, hex encoded
        assert_eq!(hash_token(&token).len(), 64);
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
