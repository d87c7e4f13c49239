//! Authentication handlers: register, login, logout, current account,
//! password rotation.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::services::AuthService;
use crate::state::AppState;

use super::UserResponse;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", put(change_password))
}

/// Request to register a new account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
}

/// Request to exchange credentials for a session token.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to rotate the caller's password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// An opened session: the bearer token and the account it belongs to.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Register a new account. Always creates role `user`.
///
/// # Errors
///
/// Returns 400 if a field fails validation, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let auth = AuthService::new(state.pool(), state.auth().token_ttl);
    let session = auth
        .register(&body.name, &body.email, &body.password, &body.address)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: UserResponse::from(&session.user),
            token: session.token,
        }),
    ))
}

/// Exchange credentials for a bearer token.
///
/// # Errors
///
/// Returns 401 on unknown email or wrong password, indistinguishably.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let auth = AuthService::new(state.pool(), state.auth().token_ttl);
    let session = auth.login(&body.email, &body.password).await?;

    Ok(Json(SessionResponse {
        user: UserResponse::from(&session.user),
        token: session.token,
    }))
}

/// Revoke the session behind the presented token.
///
/// # Errors
///
/// Returns 401 without a valid token.
pub async fn logout(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<MessageResponse>, AppError> {
    let auth = AuthService::new(state.pool(), state.auth().token_ttl);
    auth.logout(&caller.token_hash).await?;

    Ok(Json(MessageResponse {
        message: "logged out",
    }))
}

/// Return the caller's own account projection.
pub async fn me(caller: Caller) -> Json<UserResponse> {
    Json(UserResponse::from(&caller.user))
}

/// Rotate the caller's password. Every open session is revoked, the
/// caller's included.
///
/// # Errors
///
/// Returns 400 if the new password fails the policy, 401 if the current
/// password is wrong.
pub async fn change_password(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let auth = AuthService::new(state.pool(), state.auth().token_ttl);
    auth.change_password(caller.user.id, &body.current_password, &body.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "password updated",
    }))
}
