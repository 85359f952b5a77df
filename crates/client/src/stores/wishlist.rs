//! The shopper's wishlist in the session tier.

use comfycart_core::{ProductId, Wishlist, WishlistEntry};

use super::keys;
use crate::error::StorageError;
use crate::session::SessionService;
use crate::storage::{read_json, write_json};

/// The current identity's wishlist, in the session tier.
#[derive(Clone)]
pub struct WishlistStore {
    session: SessionService,
}

impl WishlistStore {
    #[must_use]
    pub const fn new(session: SessionService) -> Self {
        Self { session }
    }

    fn key(&self) -> Result<String, StorageError> {
        Ok(self.session.resolve()?.namespaced(keys::WISHLIST))
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn wishlist(&self) -> Result<Wishlist, StorageError> {
        read_json(self.session.session(), &self.key()?)
    }

    /// Entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn entries(&self) -> Result<Vec<WishlistEntry>, StorageError> {
        Ok(self.wishlist()?.entries().to_vec())
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn contains(&self, product_id: &ProductId) -> Result<bool, StorageError> {
        Ok(self.wishlist()?.contains(product_id))
    }

    /// Flip membership; returns whether the product is now saved.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    pub fn toggle(&self, entry: WishlistEntry) -> Result<bool, StorageError> {
        let key = self.key()?;
        let mut wishlist: Wishlist = read_json(self.session.session(), &key)?;
        let saved = wishlist.toggle(entry);
        write_json(self.session.session(), &key, &wishlist)?;
        Ok(saved)
    }
}
