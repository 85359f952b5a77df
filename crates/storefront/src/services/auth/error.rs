//! Authentication error types.

use thiserror::Error;

use comfycart_core::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Unknown email or wrong password.
    #[error("You have entered an invalid username or password")]
    InvalidCredentials,

    /// The authenticated account no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
