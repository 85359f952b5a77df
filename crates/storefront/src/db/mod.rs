//! Persistence for accounts, server carts and orders.
//!
//! Handlers talk to the [`UserRepository`] and [`CartRepository`] traits; the
//! binary picks the `PostgreSQL` implementations ([`users::PgUserRepository`],
//! [`carts::PgCartRepository`]) or the in-memory ones in [`memory`].
//!
//! # Tables (schema `storefront`)
//!
//! - `users` - Accounts with argon2 password hashes
//! - `cart_line` - One row per (user, product), ordered by `position`
//! - `customer_order` - Materialized orders with an optional idempotency key
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p comfycart-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use comfycart_core::{Cart, Email, Order, UserId};

use crate::models::{ProfileUpdate, User};

pub use carts::PgCartRepository;
pub use memory::{MemoryCartRepository, MemoryUserRepository};
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Result of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// A new order was materialized and the cart drained.
    Created(Order),
    /// The idempotency key was seen before; this is the original order.
    Replayed(Order),
    /// Nothing to check out.
    EmptyCart,
    /// The cart total does not fit; the cart is left as it was.
    TotalTooLarge,
}

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Look up an account by id.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up an account by normalized email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Every account, oldest first.
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Apply a profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account no longer exists and
    /// `RepositoryError::Conflict` if the new email belongs to another account.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Server-side carts and the order log.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The user's cart; empty when none was ever saved.
    async fn load(&self, user: UserId) -> Result<Cart, RepositoryError>;

    /// Replace the user's cart with `cart` (last write wins).
    async fn save(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError>;

    /// Materialize the cart into an order, record it and drain the cart, atomically.
    ///
    /// A repeated `idempotency_key` for the same user returns the order it
    /// created the first time and leaves the cart alone.
    async fn checkout(
        &self,
        user: UserId,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, RepositoryError>;

    /// The user's orders, most recent first.
    async fn orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}
