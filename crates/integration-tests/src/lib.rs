//! Integration tests for ComfyCart.
//!
//! Every test boots the storefront on an ephemeral port with in-memory
//! storage and talks to it over real HTTP through `comfycart-client`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p comfycart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use comfycart_client::{ApiClient, LoginForm, MemoryTier, Shop, SignupForm};
use comfycart_storefront::config::StorefrontConfig;
use comfycart_storefront::state::AppState;
use secrecy::SecretString;
use tokio::net::TcpListener;

/// Token secret used by every test server.
pub const TEST_SECRET: &str = "integration-test-secret-with-plenty-of-entropy-9f3k";

/// A running storefront plus a client pointed at it.
pub struct TestContext {
    pub addr: SocketAddr,
    pub api: ApiClient,
}

impl TestContext {
    /// Start a storefront on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind or the client cannot be built.
    pub async fn start() -> Self {
        let config = StorefrontConfig::in_memory(SecretString::from(TEST_SECRET));
        let app = comfycart_storefront::app(AppState::in_memory(config));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server failed");
        });

        let api = ApiClient::new(format!("http://{addr}")).expect("Failed to build API client");
        Self { addr, api }
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register an account through the signup form.
    ///
    /// # Panics
    ///
    /// Panics if the form is invalid or the server refuses it.
    pub async fn register(&self, first: &str, last: &str, email: &str, password: &str) {
        let form = SignupForm {
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: password.to_owned(),
            agree_terms: true,
        };
        let request = form.validate().expect("Signup form should be valid");
        self.api
            .register(&request)
            .await
            .expect("Registration should succeed");
    }
}

/// A client-side shop backed by fresh in-memory tiers.
#[must_use]
pub fn memory_shop() -> Shop {
    Shop::new(Arc::new(MemoryTier::new()), Arc::new(MemoryTier::new()))
}

/// Login form for `email` and `password`.
#[must_use]
pub fn login_form(email: &str, password: &str, remember_me: bool) -> LoginForm {
    LoginForm {
        email: email.to_owned(),
        password: password.to_owned(),
        remember_me,
    }
}
