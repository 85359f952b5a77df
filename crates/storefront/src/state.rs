//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::{CartRepository, UserRepository};
use crate::services::auth::TokenSigner;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    users: Arc<dyn UserRepository>,
    carts: Arc<dyn CartRepository>,
    tokens: TokenSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `users` - Account repository
    /// * `carts` - Cart and order repository
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        users: Arc<dyn UserRepository>,
        carts: Arc<dyn CartRepository>,
    ) -> Self {
        let tokens = TokenSigner::new(config.token_secret.clone(), config.token_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                carts,
                tokens,
            }),
        }
    }

    /// Application state backed by fresh in-memory repositories.
    #[must_use]
    pub fn in_memory(config: StorefrontConfig) -> Self {
        Self::new(
            config,
            Arc::new(crate::db::MemoryUserRepository::new()),
            Arc::new(crate::db::MemoryCartRepository::new()),
        )
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Account repository.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }

    /// Cart and order repository.
    #[must_use]
    pub fn carts(&self) -> &dyn CartRepository {
        self.inner.carts.as_ref()
    }

    /// Bearer token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }
}
