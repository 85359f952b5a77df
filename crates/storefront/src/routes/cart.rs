//! Server cart and checkout handlers.
//!
//! Every handler requires a bearer token whose principal owns `{user_id}`.
//! Mutations load the cart, apply the change with the shared cart rules and
//! write the whole cart back, unless its total no longer fits (422).

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use tracing::instrument;

use comfycart_core::api::{AddToCartRequest, CartView, IDEMPOTENCY_KEY_HEADER, SetQuantityRequest};
use comfycart_core::{Cart, Order, ProductId, UserId};

use super::ApiJson;
use crate::db::CheckoutOutcome;
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, RequireAuth};
use crate::state::AppState;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Cart with its totals, or 422 when the total does not fit.
fn cart_view(cart: &Cart) -> Result<CartView> {
    CartView::try_from(cart)
        .map_err(|_| AppError::Unprocessable("Cart total is too large".to_owned()))
}

/// Parse `{user_id}` and check the principal owns it.
pub(super) fn owned_user(auth: &AuthUser, raw: &str) -> Result<UserId> {
    let user = raw
        .parse::<UserId>()
        .map_err(|_| AppError::Forbidden("You do not have access to this cart".to_owned()))?;
    auth.ensure_owns(user)?;
    Ok(user)
}

async fn update_cart(
    state: &AppState,
    user: UserId,
    change: impl FnOnce(&mut Cart) -> Result<()>,
) -> Result<Json<CartView>> {
    let mut cart = state.carts().load(user).await?;
    change(&mut cart)?;
    let view = cart_view(&cart)?;
    state.carts().save(user, &cart).await?;
    Ok(Json(view))
}

/// GET /api/cart/{user_id}
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<String>,
) -> Result<Json<CartView>> {
    let user = owned_user(&auth, &user_id)?;
    let cart = state.carts().load(user).await?;
    cart_view(&cart).map(Json)
}

/// POST /api/cart/{user_id}
#[instrument(skip(state, auth, req), fields(product_id = %req.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<String>,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let user = owned_user(&auth, &user_id)?;
    let quantity = match req.quantity {
        None => 1,
        Some(n) if n < 1 => {
            return Err(AppError::Unprocessable(
                "Quantity must be at least 1".to_owned(),
            ));
        }
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
    };

    update_cart(&state, user, |cart| {
        cart.add_quantity(req.product(), quantity);
        Ok(())
    })
    .await
}

/// PATCH /api/cart/{user_id}/{product_id}
#[instrument(skip(state, auth))]
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path((user_id, product_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let user = owned_user(&auth, &user_id)?;
    let product_id = ProductId::new(product_id);
    update_cart(&state, user, |cart| {
        if cart.set_quantity(&product_id, req.quantity) {
            Ok(())
        } else {
            Err(AppError::NotFound("Product not in cart".to_owned()))
        }
    })
    .await
}

/// DELETE /api/cart/{user_id}/{product_id}
#[instrument(skip(state, auth))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<Json<CartView>> {
    let user = owned_user(&auth, &user_id)?;
    let product_id = ProductId::new(product_id);
    update_cart(&state, user, |cart| {
        cart.remove_line(&product_id);
        Ok(())
    })
    .await
}

/// DELETE /api/cart/{user_id}
#[instrument(skip(state, auth))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<String>,
) -> Result<Json<CartView>> {
    let user = owned_user(&auth, &user_id)?;
    update_cart(&state, user, |cart| {
        cart.clear();
        Ok(())
    })
    .await
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map(str::trim)
        .map_err(|_| AppError::Unprocessable("Invalid idempotency key".to_owned()))?;
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(AppError::Unprocessable("Invalid idempotency key".to_owned()));
    }
    Ok(Some(key.to_owned()))
}

/// POST /api/cart/{user_id}/checkout
///
/// 201 with a new order; 200 with the original order when the
/// `Idempotency-Key` was already used by this user.
#[instrument(skip(state, auth, headers))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Order>)> {
    let user = owned_user(&auth, &user_id)?;
    let key = idempotency_key(&headers)?;

    match state
        .carts()
        .checkout(user, key.as_deref(), Utc::now())
        .await?
    {
        CheckoutOutcome::Created(order) => {
            tracing::info!(
                user_id = %user,
                order_id = %order.id,
                total = %order.total,
                "order placed"
            );
            Ok((StatusCode::CREATED, Json(order)))
        }
        CheckoutOutcome::Replayed(order) => {
            tracing::info!(user_id = %user, order_id = %order.id, "checkout replayed");
            Ok((StatusCode::OK, Json(order)))
        }
        CheckoutOutcome::EmptyCart => Err(AppError::Unprocessable("Cart is empty".to_owned())),
        CheckoutOutcome::TotalTooLarge => Err(AppError::Unprocessable(
            "Cart total is too large".to_owned(),
        )),
    }
}
