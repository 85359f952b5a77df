//! HTTP route handlers for the storefront REST API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                           - Liveness
//! GET    /health/ready                     - Readiness (repository ping)
//!
//! # Accounts
//! POST   /api/user/register                - Register (201)
//! POST   /api/user/login                   - Login, returns bearer token
//! GET    /api/user/                        - List users
//! GET    /api/user/{id}                    - Fetch one user
//! PATCH  /api/user/edit                    - Edit own profile (auth)
//!
//! # Cart (auth, principal must own {user_id})
//! GET    /api/cart/{user_id}               - Cart with totals
//! POST   /api/cart/{user_id}               - Add product
//! DELETE /api/cart/{user_id}               - Clear
//! PATCH  /api/cart/{user_id}/{product_id}  - Set quantity (clamped to >= 1)
//! DELETE /api/cart/{user_id}/{product_id}  - Remove line
//! POST   /api/cart/{user_id}/checkout      - Place order (Idempotency-Key aware)
//! GET    /api/orders/{user_id}             - Order history, newest first
//! ```

pub mod cart;
pub mod orders;
pub mod users;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    middleware::map_response,
    routing::{get, patch, post},
};

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, rate_limit_json};
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Unprocessable(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the repositories are not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.users().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Login and registration, rate limited per client IP when `rate_limit` is set.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/api/user/register", post(users::register))
        .route("/api/user/login", post(users::login));

    if rate_limit {
        router
            .layer(auth_rate_limiter())
            .layer(map_response(rate_limit_json))
    } else {
        router
    }
}

/// Account routes other than login and registration.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user", get(users::list))
        .route("/api/user/", get(users::list))
        .route("/api/user/edit", patch(users::edit))
        .route("/api/user/{id}", get(users::show))
}

/// Server cart, checkout and order history routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/cart/{user_id}",
            get(cart::show).post(cart::add).delete(cart::clear),
        )
        .route("/api/cart/{user_id}/checkout", post(cart::checkout))
        .route(
            "/api/cart/{user_id}/{product_id}",
            patch(cart::set_quantity).delete(cart::remove),
        )
        .route("/api/orders/{user_id}", get(orders::list))
}

/// Create all routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_routes(rate_limit))
        .merge(user_routes())
        .merge(cart_routes())
}

#[cfg(test)]
mod tests;
