//! Order history handler.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use comfycart_core::Order;

use super::cart::owned_user;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// GET /api/orders/{user_id}
///
/// Most recent first.
#[instrument(skip(state, auth))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>> {
    let user = owned_user(&auth, &user_id)?;
    Ok(Json(state.carts().orders(user).await?))
}
