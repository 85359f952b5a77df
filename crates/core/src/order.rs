//! Immutable order snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{Money, OrderId};

/// A materialized cart.
///
/// Produced by [`Cart::materialize`](crate::Cart::materialize); never mutated
/// afterwards. `total` is the cart subtotal at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "orderId")]
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub lines: Vec<CartLine>,
}

impl Order {
    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}
