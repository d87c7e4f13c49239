//! Service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during service operations.
///
/// Each variant maps to one HTTP status at the edge; the carried message is
/// what the client sees.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request data failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Credentials or session token rejected.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// The caller's role or ownership does not cover the operation.
    #[error("{0}")]
    Forbidden(&'static str),

    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// The account is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(&'static str),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
