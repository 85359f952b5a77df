//! Per-identity wishlist.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub name: String,
}

/// A set of products in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Flip membership of `entry.product_id`. Returns `true` if the product is
    /// now on the wishlist.
    pub fn toggle(&mut self, entry: WishlistEntry) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != entry.product_id);
        if self.entries.len() != before {
            return false;
        }
        self.entries.push(entry);
        true
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.iter().any(|e| &e.product_id == product_id)
    }

    #[must_use]
    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
