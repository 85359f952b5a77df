//! The shopper's cart in the durable tier.

use comfycart_core::{Cart, CartLine, ProductId, ProductSnapshot, Totals};

use super::keys;
use crate::error::{CartError, StorageError};
use crate::session::SessionService;
use crate::storage::{read_json, write_json};

/// The current identity's cart, mirrored to the durable tier.
///
/// Every mutation is a full read-modify-write of the stored cart and returns
/// the freshly computed totals. A change whose total would not fit is
/// refused before anything is written.
#[derive(Clone)]
pub struct CartStore {
    session: SessionService,
}

impl CartStore {
    #[must_use]
    pub const fn new(session: SessionService) -> Self {
        Self { session }
    }

    fn key(&self) -> Result<String, StorageError> {
        Ok(self.session.resolve()?.namespaced(keys::CART))
    }

    /// The stored cart (empty if none).
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn cart(&self) -> Result<Cart, StorageError> {
        let lines: Vec<CartLine> = read_json(self.session.durable(), &self.key()?)?;
        Ok(Cart::from_lines(lines))
    }

    /// Current totals.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the stored total does
    /// not fit.
    pub fn totals(&self) -> Result<Totals, CartError> {
        Ok(self.cart()?.totals()?)
    }

    fn mutate(&self, f: impl FnOnce(&mut Cart)) -> Result<Totals, CartError> {
        let key = self.key()?;
        let lines: Vec<CartLine> = read_json(self.session.durable(), &key)?;
        let mut cart = Cart::from_lines(lines);
        f(&mut cart);
        let totals = cart.totals()?;
        write_json(self.session.durable(), &key, &cart)?;
        Ok(totals)
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written, or if the new
    /// total does not fit.
    pub fn add_line(&self, product: ProductSnapshot) -> Result<Totals, CartError> {
        self.mutate(|cart| cart.add_line(product))
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written, or if the new
    /// total does not fit.
    pub fn add_quantity(
        &self,
        product: ProductSnapshot,
        quantity: u32,
    ) -> Result<Totals, CartError> {
        self.mutate(|cart| cart.add_quantity(product, quantity))
    }

    /// Remove a line; absent products are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    pub fn remove_line(&self, product_id: &ProductId) -> Result<Totals, CartError> {
        self.mutate(|cart| {
            cart.remove_line(product_id);
        })
    }

    /// Set a line's quantity, clamped to at least 1.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written, or if the new
    /// total does not fit.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<Totals, CartError> {
        self.mutate(|cart| {
            cart.set_quantity(product_id, quantity);
        })
    }

    /// Empty the current identity's cart. Other identities are untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        write_json(self.session.durable(), &self.key()?, &Cart::new())
    }

    /// Overwrite the cache with `cart` (e.g. the server's copy).
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written or the total of `cart`
    /// does not fit, in which case the cache is left as it was.
    pub fn replace(&self, cart: &Cart) -> Result<Totals, CartError> {
        let totals = cart.totals()?;
        write_json(self.session.durable(), &self.key()?, cart)?;
        Ok(totals)
    }
}
