//! Unified error handling for the HTTP API.
//!
//! Every handler returns [`AppError`]; the response body is always
//! `{"message": "..."}` with a status drawn from the error's category.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;

/// Application-level error type for API handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Database operation failed outside a service.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Service(e) => match e {
                ServiceError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
                ServiceError::InvalidState(message) => {
                    (StatusCode::BAD_REQUEST, (*message).to_owned())
                }
                ServiceError::Unauthorized(message) => {
                    (StatusCode::UNAUTHORIZED, (*message).to_owned())
                }
                ServiceError::Forbidden(message) => (StatusCode::FORBIDDEN, (*message).to_owned()),
                ServiceError::NotFound(message) => (StatusCode::NOT_FOUND, (*message).to_owned()),
                ServiceError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
                ServiceError::PasswordHash | ServiceError::Repository(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                ),
            },
            Self::Repository(e) => match e {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
                RepositoryError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors; clients never see their details
        if matches!(
            self,
            Self::Repository(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
                | Self::Service(ServiceError::Repository(_) | ServiceError::PasswordHash)
        ) {
            tracing::error!(error = %self, "API request error");
        }

        let (status, message) = self.status_and_message();

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(ServiceError::InvalidInput("bad field".to_owned()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::InvalidState("no store associated with this account").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::Unauthorized("invalid credentials").into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ServiceError::Forbidden("admin access required").into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ServiceError::NotFound("store not found").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::Conflict("email already exists".to_owned()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Repository(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: AppError = ServiceError::PasswordHash.into();
        let (_, message) = err.status_and_message();
        assert_eq!(message, "internal server error");

        let err = AppError::Repository(RepositoryError::DataCorruption(
            "invalid email in database".to_owned(),
        ));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "internal server error");
    }
}
