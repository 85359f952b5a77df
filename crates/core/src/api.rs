//! Request and response bodies of the storefront REST API.
//!
//! Shared by the backend handlers and the typed client so both sides agree
//! on field names. Request fields that a handler validates itself default to
//! empty rather than failing deserialization, so a missing field is reported
//! with the same message as an empty one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine, ProductSnapshot};
use crate::types::{Email, Money, MoneyError, ProductId, UserId};
use crate::validation::FieldError;

/// Minimum password length (after trimming) accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Header carrying the client-chosen checkout deduplication key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// `POST /api/user/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// `POST /api/user/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: UserId,
    pub name: String,
}

/// A user account as exposed by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// `PATCH /api/user/edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditProfileRequest {
    pub name: String,
    pub email: String,
    pub curr_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_new_password: Option<String>,
}

/// `POST /api/cart/{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    #[serde(default)]
    pub image_ref: String,
    /// Units to add; `None` means one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl AddToCartRequest {
    /// Build a request adding `quantity` units of `product`.
    #[must_use]
    pub fn new(product: ProductSnapshot, quantity: Option<i64>) -> Self {
        Self {
            product_id: product.product_id,
            title: product.title,
            unit_price: product.unit_price,
            image_ref: product.image_ref,
            quantity,
        }
    }

    /// The product part of the request.
    #[must_use]
    pub fn product(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.product_id.clone(),
            title: self.title.clone(),
            unit_price: self.unit_price,
            image_ref: self.image_ref.clone(),
        }
    }
}

/// `PATCH /api/cart/{userId}/{productId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// A cart with its derived totals, as returned by every cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub count: u64,
    pub total: Money,
}

impl TryFrom<&Cart> for CartView {
    type Error = MoneyError;

    fn try_from(cart: &Cart) -> Result<Self, Self::Error> {
        let totals = cart.totals()?;
        Ok(Self {
            lines: cart.lines().to_vec(),
            count: totals.count,
            total: totals.total,
        })
    }
}

impl From<CartView> for Cart {
    fn from(view: CartView) -> Self {
        Self::from_lines(view.lines)
    }
}

/// Plain acknowledgement body, e.g. after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}
