//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the body `{"message": "...", "errors": [...]}`;
//! `errors` is present only for field validation failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use comfycart_core::ValidationErrors;
use comfycart_core::api::ErrorBody;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, TokenError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Bearer token missing, invalid or expired.
    #[error("{0}")]
    Token(#[from] TokenError),

    /// Request fields failed validation.
    #[error("{}", .0.first_message().unwrap_or("Validation failed"))]
    Validation(ValidationErrors),

    /// Request is well-formed but cannot be processed.
    #[error("{0}")]
    Unprocessable(String),

    /// Authenticated, but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Rate limited.
    #[error("Too many requests")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Token(err) => matches!(err, TokenError::Key | TokenError::Encode(_)),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Auth(AuthError::UserNotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(_) | Self::Validation(_) | Self::Unprocessable(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        // Don't expose internal error details to clients
        if self.is_server_error() {
            return ErrorBody {
                message: "Internal server error".to_owned(),
                errors: Vec::new(),
            };
        }
        match self {
            Self::Validation(errors) | Self::Auth(AuthError::Validation(errors)) => ErrorBody {
                message: errors
                    .first_message()
                    .unwrap_or("Validation failed")
                    .to_owned(),
                errors: errors.errors().to_vec(),
            },
            Self::Auth(err) => ErrorBody {
                message: err.to_string(),
                errors: Vec::new(),
            },
            other => ErrorBody {
                message: other.to_string(),
                errors: Vec::new(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
