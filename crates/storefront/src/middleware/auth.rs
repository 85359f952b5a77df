//! Bearer token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use comfycart_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::TokenError;
use crate::state::AppState;

/// The principal a verified bearer token was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
}

impl AuthUser {
    /// Fail with 403 unless this principal is `owner`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for any other user id.
    pub fn ensure_owns(&self, owner: UserId) -> Result<(), AppError> {
        if self.id == owner {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this cart".to_owned(),
            ))
        }
    }
}

/// Extractor that requires `Authorization: Bearer <token>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::Missing)?;

        let claims = state.tokens().verify(token, Utc::now())?;
        let user = AuthUser {
            id: claims.user_id()?,
            name: claims.name,
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        set_sentry_user(&user.id);

        Ok(Self(user))
    }
}
