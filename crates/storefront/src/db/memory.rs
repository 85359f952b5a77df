//! In-memory repositories for local runs and tests.
//!
//! State lives behind a `tokio::sync::RwLock`; every operation takes the lock
//! once, so checkout is atomic with respect to other requests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use comfycart_core::{Cart, Email, MaterializeError, Order, UserId};

use super::{CartRepository, CheckoutOutcome, RepositoryError, UserRepository};
use crate::models::{ProfileUpdate, User};

#[derive(Default)]
struct Accounts {
    last_id: i32,
    users: Vec<User>,
}

/// Account repository held in process memory.
#[derive(Default)]
pub struct MemoryUserRepository {
    accounts: RwLock<Accounts>,
}

impl MemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.users.iter().any(|u| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        accounts.last_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(accounts.last_id),
            name: name.to_owned(),
            email: email.clone(),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };
        accounts.users.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.accounts.read().await.users.clone())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .users
            .iter()
            .any(|u| u.email == update.email && u.id != id)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = accounts
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.name.clone_from(&update.name);
        user.email = update.email.clone();
        if let Some(hash) = &update.password_hash {
            user.password_hash.clone_from(hash);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

struct RecordedOrder {
    idempotency_key: Option<String>,
    order: Order,
}

#[derive(Default)]
struct Shopper {
    cart: Cart,
    /// Oldest first.
    orders: Vec<RecordedOrder>,
}

/// Cart and order repository held in process memory.
#[derive(Default)]
pub struct MemoryCartRepository {
    shoppers: RwLock<HashMap<UserId, Shopper>>,
}

impl MemoryCartRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepository for MemoryCartRepository {
    async fn load(&self, user: UserId) -> Result<Cart, RepositoryError> {
        let shoppers = self.shoppers.read().await;
        Ok(shoppers.get(&user).map(|s| s.cart.clone()).unwrap_or_default())
    }

    async fn save(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let mut shoppers = self.shoppers.write().await;
        shoppers.entry(user).or_default().cart = cart.clone();
        Ok(())
    }

    async fn checkout(
        &self,
        user: UserId,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        let mut shoppers = self.shoppers.write().await;
        let shopper = shoppers.entry(user).or_default();

        if let Some(key) = idempotency_key
            && let Some(seen) = shopper
                .orders
                .iter()
                .find(|r| r.idempotency_key.as_deref() == Some(key))
        {
            return Ok(CheckoutOutcome::Replayed(seen.order.clone()));
        }

        let order = match shopper.cart.materialize(now) {
            Ok(order) => order,
            Err(MaterializeError::Empty(_)) => return Ok(CheckoutOutcome::EmptyCart),
            Err(MaterializeError::Total(_)) => return Ok(CheckoutOutcome::TotalTooLarge),
        };
        shopper.orders.push(RecordedOrder {
            idempotency_key: idempotency_key.map(str::to_owned),
            order: order.clone(),
        });
        shopper.cart.clear();
        Ok(CheckoutOutcome::Created(order))
    }

    async fn orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let shoppers = self.shoppers.read().await;
        Ok(shoppers
            .get(&user)
            .map(|s| s.orders.iter().rev().map(|r| r.order.clone()).collect())
            .unwrap_or_default())
    }
}
