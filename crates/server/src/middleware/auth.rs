//! Authentication extractors.
//!
//! Provides extractors for requiring authentication in route handlers.
//!
//! ## Authentication Flow
//!
//! 1. Extract `Authorization: Bearer <token>` header
//! 2. Digest the token the way issued tokens are stored
//! 3. Resolve the digest to an account, rejecting expired tokens
//! 4. For gated routes, check the account's role covers the route

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use ratebook_core::Role;

use crate::db::{RepositoryError, TokenRepository};
use crate::models::User;
use crate::services::auth::hash_token;
use crate::state::AppState;

/// The authenticated account behind a request.
///
/// Carries the digest of the presented token so logout can revoke exactly
/// the session that made the request.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(caller: Caller) -> impl IntoResponse {
///     format!("Hello, {}!", caller.user.name)
/// }
/// ```
#[derive(Debug)]
pub struct Caller {
    /// The account the token resolved to.
    pub user: User,
    /// Digest of the presented token.
    pub token_hash: String,
}

/// Error returned when authentication or the role gate fails.
#[derive(Debug)]
pub enum AuthRejection {
    /// Missing or malformed `Authorization` header.
    MissingToken,
    /// Token unknown, revoked, or expired.
    InvalidToken,
    /// Authenticated, but the role doesn't cover this route.
    Forbidden(&'static str),
    /// Database failure while resolving the token.
    Internal(RepositoryError),
}

impl AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::MissingToken => "authentication required",
            Self::InvalidToken => "invalid or expired token",
            Self::Forbidden(message) => message,
            Self::Internal(_) => "internal server error",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, "Token resolution failed");
        }

        let status = self.status_code();
        let message = self.message().to_owned();

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Parse a Bearer token from the Authorization header.
fn parse_bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").map(str::trim)
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthRejection::MissingToken)?
            .to_str()
            .map_err(|_| AuthRejection::MissingToken)?;

        let token = parse_bearer_token(auth_header).ok_or(AuthRejection::MissingToken)?;
        let token_hash = hash_token(token);

        let user = TokenRepository::new(state.pool())
            .resolve(&token_hash, Utc::now())
            .await
            .map_err(AuthRejection::Internal)?
            .ok_or(AuthRejection::InvalidToken)?;

        Ok(Self { user, token_hash })
    }
}

/// Extractor that requires an administrator.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(AdminCaller(caller): AdminCaller) -> impl IntoResponse {
///     format!("Hello, {}!", caller.user.name)
/// }
/// ```
pub struct AdminCaller(pub Caller);

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;

        if !caller.user.role.policy().can_manage_directory {
            return Err(AuthRejection::Forbidden("admin access required"));
        }

        Ok(Self(caller))
    }
}

/// Extractor that requires a store owner.
///
/// Whether the owner actually has a store linked is checked downstream; this
/// gate only keeps other roles off the owner routes.
pub struct OwnerCaller(pub Caller);

impl FromRequestParts<AppState> for OwnerCaller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;

        if caller.user.role != Role::Owner {
            return Err(AuthRejection::Forbidden("owner access required"));
        }

        Ok(Self(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_token_valid() {
        assert_eq!(parse_bearer_token("Bearer abc123"), Some("abc123"));
    }

    #[test]
    fn test_parse_bearer_token_with_whitespace() {
        assert_eq!(parse_bearer_token("Bearer  abc123 "), Some("abc123"));
    }

    #[test]
    fn test_parse_bearer_token_invalid() {
        assert_eq!(parse_bearer_token("Basic abc123"), None);
        assert_eq!(parse_bearer_token("bearer abc123"), None); // case sensitive
        assert_eq!(parse_bearer_token("Bearerabc123"), None); // no space
        assert_eq!(parse_bearer_token(""), None);
    }

    #[test]
    fn test_auth_rejection_status_codes() {
        assert_eq!(
            AuthRejection::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::InvalidToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden("admin access required").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::Internal(RepositoryError::NotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_rejection_messages() {
        assert_eq!(AuthRejection::MissingToken.message(), "authentication required");
        assert_eq!(AuthRejection::InvalidToken.message(), "invalid or expired token");
        assert_eq!(
            AuthRejection::Internal(RepositoryError::NotFound).message(),
            "internal server error"
        );
    }
}
