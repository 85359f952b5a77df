//! The shopper's order log in the durable tier.

use comfycart_core::Order;

use super::keys;
use crate::error::StorageError;
use crate::session::SessionService;
use crate::storage::{read_json, write_json};

/// The current identity's order log, most recent first, in the durable tier.
#[derive(Clone)]
pub struct OrderStore {
    session: SessionService,
}

impl OrderStore {
    #[must_use]
    pub const fn new(session: SessionService) -> Self {
        Self { session }
    }

    fn key(&self) -> Result<String, StorageError> {
        Ok(self.session.resolve()?.namespaced(keys::ORDERS))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn orders(&self) -> Result<Vec<Order>, StorageError> {
        read_json(self.session.durable(), &self.key()?)
    }

    /// Prepend `order` to the log. An order already in the log is not added
    /// again.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written.
    pub fn record(&self, order: &Order) -> Result<(), StorageError> {
        let key = self.key()?;
        let mut orders: Vec<Order> = read_json(self.session.durable(), &key)?;
        if orders.iter().any(|o| o.id == order.id) {
            return Ok(());
        }
        orders.insert(0, order.clone());
        write_json(self.session.durable(), &key, &orders)
    }

    /// Replace the whole log (e.g. with the server's history).
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn replace(&self, orders: &[Order]) -> Result<(), StorageError> {
        write_json(self.session.durable(), &self.key()?, orders)
    }
}
