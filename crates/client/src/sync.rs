//! Talking to the backend: sign-in and the server-authoritative cart.
//!
//! For a signed-in shopper the server cart is the source of truth and the
//! local [`CartStore`](crate::CartStore) is an optimistic cache of it. Guests
//! never leave the local store.

use chrono::{DateTime, Utc};
use comfycart_core::api::{AddToCartRequest, CartView};
use comfycart_core::{Cart, Order, ProductId, ProductSnapshot, Totals};
use secrecy::SecretString;

use crate::api::ApiClient;
use crate::error::{ApiError, CartError, CheckoutError, LoginError, StorageError, SyncError};
use crate::forms::LoginForm;
use crate::session::AuthRecord;
use crate::shop::Shop;

/// Validate `form`, log in, fetch the profile and record the session.
///
/// The profile supplies the normalized email that becomes the identity key,
/// so every namespaced read after this call uses the new identity.
///
/// # Errors
///
/// Returns `LoginError::Invalid` without contacting the server when the
/// form fails validation, `LoginError::Api` when the server refuses.
pub async fn sign_in(api: &ApiClient, shop: &Shop, form: &LoginForm) -> Result<AuthRecord, LoginError> {
    let request = form.validate()?;
    let login = api.login(&request).await?;
    let profile = api.user(login.id).await?;

    let record = AuthRecord {
        token: SecretString::from(login.token),
        user_id: login.id,
        name: login.name,
        email: profile.email,
    };
    shop.session().sign_in(&record, form.remember_me)?;
    Ok(record)
}

/// Keeps the local cart cache in step with the server cart.
pub struct CartSync<'a> {
    api: &'a ApiClient,
    shop: &'a Shop,
}

impl<'a> CartSync<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, shop: &'a Shop) -> Self {
        Self { api, shop }
    }

    fn signed_in(&self) -> Result<Option<AuthRecord>, StorageError> {
        self.shop.session().current()
    }

    /// Adopt the server's answer, or keep the optimistic state if the server
    /// could not be reached.
    fn settle(
        &self,
        optimistic: Totals,
        remote: Result<CartView, ApiError>,
    ) -> Result<Totals, CartError> {
        match remote {
            Ok(view) => self.shop.cart().replace(&Cart::from(view)),
            Err(e) => {
                tracing::warn!(error = %e, "Cart sync failed, keeping local state");
                Ok(optimistic)
            }
        }
    }

    /// Add `quantity` units locally, then push to the server.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local change fails; server failures are
    /// logged and leave the optimistic state in place.
    pub async fn add(&self, product: ProductSnapshot, quantity: u32) -> Result<Totals, CartError> {
        let optimistic = self.shop.cart().add_quantity(product.clone(), quantity)?;
        let Some(auth) = self.signed_in()? else {
            return Ok(optimistic);
        };
        let request = AddToCartRequest::new(product, Some(i64::from(quantity.max(1))));
        let remote = self.api.add_to_cart(&auth.token, auth.user_id, &request).await;
        self.settle(optimistic, remote)
    }

    /// Set a quantity locally, then on the server.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local change fails.
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<Totals, CartError> {
        let optimistic = self.shop.cart().set_quantity(product_id, quantity)?;
        let Some(auth) = self.signed_in()? else {
            return Ok(optimistic);
        };
        let remote = self
            .api
            .set_quantity(&auth.token, auth.user_id, product_id, quantity)
            .await;
        self.settle(optimistic, remote)
    }

    /// Remove a line locally, then on the server.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local change fails.
    pub async fn remove(&self, product_id: &ProductId) -> Result<Totals, CartError> {
        let optimistic = self.shop.cart().remove_line(product_id)?;
        let Some(auth) = self.signed_in()? else {
            return Ok(optimistic);
        };
        let remote = self
            .api
            .remove_from_cart(&auth.token, auth.user_id, product_id)
            .await;
        self.settle(optimistic, remote)
    }

    /// Replace the local cache with the server cart (and order history).
    /// Guests keep their local cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the server or local storage fails.
    pub async fn pull(&self) -> Result<Totals, SyncError> {
        let Some(auth) = self.signed_in()? else {
            return Ok(self.shop.cart().totals()?);
        };
        let view = self.api.cart(&auth.token, auth.user_id).await?;
        let orders = self.api.orders(&auth.token, auth.user_id).await?;
        self.shop.orders().replace(&orders)?;
        Ok(self.shop.cart().replace(&Cart::from(view))?)
    }

    /// A fresh idempotency key for one checkout attempt.
    ///
    /// Mint it once when the shopper submits and pass the same key to every
    /// retry of that submission.
    #[must_use]
    pub fn checkout_key() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Check out.
    ///
    /// Signed in, the server materializes the order under `idempotency_key`,
    /// so retrying with the same key returns the original order instead of
    /// creating a second one. Guests check out locally and the key is unused.
    ///
    /// Once the server has accepted the order, recording it locally and
    /// clearing the cached cart are best effort: failures are logged and the
    /// order is still returned.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty guest cart and
    /// `CheckoutError::Api` when the server refuses (422 for an empty cart).
    pub async fn checkout(
        &self,
        idempotency_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        let Some(auth) = self.signed_in()? else {
            return self.shop.checkout(now);
        };
        let (order, created) = self
            .api
            .checkout(&auth.token, auth.user_id, Some(idempotency_key))
            .await?;
        if let Err(e) = self.shop.orders().record(&order) {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to record order locally");
        }
        if let Err(e) = self.shop.cart().clear() {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to clear local cart");
        }
        tracing::info!(order_id = %order.id, created, "Order placed on server");
        Ok(order)
    }
}
