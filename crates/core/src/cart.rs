//! Cart lines, derived totals and order materialization.
//!
//! # Invariants
//!
//! - At most one line per product.
//! - Every line has `quantity >= 1`. Lowering a quantity clamps at 1; only
//!   [`Cart::remove_line`] and [`Cart::clear`] take lines out.
//! - Totals are never stored. [`Cart::totals`] folds over the lines each time
//!   and reports `MoneyError::Overflow` instead of wrapping or panicking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::types::{Money, MoneyError, OrderId, ProductId};

/// Returned when materializing an order from a cart with no lines.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot check out an empty cart")]
pub struct EmptyCartError;

/// Why a cart could not become an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    #[error(transparent)]
    Empty(#[from] EmptyCartError),

    #[error("cart total cannot be computed: {0}")]
    Total(#[from] MoneyError),
}

/// What "add to cart" receives: a product without a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    #[serde(default)]
    pub image_ref: String,
}

/// One product-and-quantity entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    #[serde(default)]
    pub image_ref: String,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the product does not fit.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.unit_price.times(self.quantity)
    }
}

/// Count and total of a cart, computed from its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line quantities.
    pub count: u64,
    /// Sum of `unit_price × quantity`.
    pub total: Money,
}

/// An ordered sequence of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Rebuild a cart from stored lines.
    ///
    /// Duplicate products are merged into the first occurrence and quantities
    /// below 1 are raised to 1, so a cart read from storage always upholds the
    /// module invariants.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for mut line in lines {
            line.quantity = line.quantity.max(1);
            match cart.position(&line.product_id) {
                Some(idx) => {
                    if let Some(existing) = cart.lines.get_mut(idx) {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                    }
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product_id == product_id)
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line or appends a new line with quantity 1.
    pub fn add_line(&mut self, product: ProductSnapshot) {
        self.add_quantity(product, 1);
    }

    /// Add `quantity` units of `product` (treated as at least 1).
    ///
    /// An existing line keeps its title, price and image; only its quantity
    /// grows.
    pub fn add_quantity(&mut self, product: ProductSnapshot, quantity: u32) {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }
        self.lines.push(CartLine {
            product_id: product.product_id,
            title: product.title,
            unit_price: product.unit_price,
            image_ref: product.image_ref,
            quantity,
        });
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove_line(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        self.lines.len() != before
    }

    /// Set the quantity of an existing line, clamped to `1..=u32::MAX`.
    ///
    /// Returns `false` when the product is not in the cart (nothing changes).
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        let clamped = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        match self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            Some(line) => {
                line.quantity = clamped;
                true
            }
            None => false,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Count and total, recomputed from the lines.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the total does not fit.
    pub fn totals(&self) -> Result<Totals, MoneyError> {
        Ok(Totals {
            count: self.lines.iter().map(|l| u64::from(l.quantity)).sum(),
            total: Money::try_sum(self.lines.iter().map(CartLine::line_total))?,
        })
    }

    /// Snapshot this cart into an order created at `now`.
    ///
    /// The cart itself is left untouched; callers clear it once the order has
    /// been recorded.
    ///
    /// # Errors
    ///
    /// Returns `MaterializeError::Empty` if the cart has no lines and
    /// `MaterializeError::Total` if its total does not fit.
    pub fn materialize(&self, now: DateTime<Utc>) -> Result<Order, MaterializeError> {
        if self.is_empty() {
            return Err(EmptyCartError.into());
        }
        Ok(Order {
            id: OrderId::generate(now),
            created_at: now,
            total: self.totals()?.total,
            lines: self.lines.clone(),
        })
    }
}
