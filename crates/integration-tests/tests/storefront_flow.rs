//! End-to-end flows: the client crate against a live in-memory storefront.
//!
//! Run with: cargo test -p comfycart-integration-tests

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use comfycart_client::{
    ApiError, CartSync, CheckoutError, LoginError, MemoryTier, Shop, StorageError, StorageTier,
    sign_in,
};
use comfycart_core::api::{AddToCartRequest, EditProfileRequest};
use comfycart_core::{IdentityKey, Money, ProductId, ProductSnapshot};
use comfycart_integration_tests::{TestContext, login_form, memory_shop};
use reqwest::StatusCode;
use secrecy::SecretString;

fn product(id: &str, cents: u32) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        title: format!("Product {id}"),
        unit_price: Money::from_cents(cents),
        image_ref: format!("{id}.png"),
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::start().await;
    ctx.api.health().await.unwrap();
}

#[tokio::test]
async fn test_register_then_sign_in_switches_identity() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "Ann@Example.com", "hunter2222").await;

    let shop = memory_shop();
    assert!(shop.session().resolve().unwrap().is_guest());

    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", true),
    )
    .await
    .unwrap();

    assert_eq!(record.name, "Ann Lee");
    assert_eq!(
        shop.session().resolve().unwrap(),
        IdentityKey::for_email(&record.email)
    );
    assert_eq!(record.email.as_str(), "ann@example.com");

    let users = ctx.api.users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, record.user_id);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let request = comfycart_core::api::RegisterRequest {
        name: "Other Ann".to_owned(),
        email: "ann@example.com".to_owned(),
        password: "hunter2222".to_owned(),
        password2: "hunter2222".to_owned(),
    };
    let err = ctx.api.register(&request).await.unwrap_err();
    match err {
        ApiError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Email already registered");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_wrong_password_leaves_shopper_a_guest() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = memory_shop();
    let err = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "wrong-password", false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, LoginError::Api(ref e) if e.status() == Some(422)));
    assert!(shop.session().current().unwrap().is_none());
}

#[tokio::test]
async fn test_edit_profile_changes_password() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = memory_shop();
    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", false),
    )
    .await
    .unwrap();

    let updated = ctx
        .api
        .edit_profile(
            &record.token,
            &EditProfileRequest {
                name: "Ann Smith".to_owned(),
                email: "ann.smith@example.com".to_owned(),
                curr_password: "hunter2222".to_owned(),
                new_password: Some("correct-horse".to_owned()),
                confirm_new_password: Some("correct-horse".to_owned()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Ann Smith");

    let relogin = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann.smith@example.com", "correct-horse", false),
    )
    .await
    .unwrap();
    assert_eq!(relogin.user_id, record.user_id);
    assert_eq!(
        shop.session().resolve().unwrap().as_str(),
        "ann.smith@example.com"
    );
}

// ============================================================================
// Cart synchronization
// ============================================================================

#[tokio::test]
async fn test_guest_cart_stays_local() {
    let ctx = TestContext::start().await;
    let shop = memory_shop();
    let sync = CartSync::new(&ctx.api, &shop);

    let totals = sync.add(product("mug", 1250), 2).await.unwrap();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.total, Money::from_cents(2500));

    // Nobody signed in: pull keeps the local cart.
    let pulled = sync.pull().await.unwrap();
    assert_eq!(pulled, totals);
}

#[tokio::test]
async fn test_signed_in_cart_follows_server() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = memory_shop();
    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", true),
    )
    .await
    .unwrap();
    let sync = CartSync::new(&ctx.api, &shop);

    sync.add(product("mug", 1000), 1).await.unwrap();
    sync.add(product("mug", 1000), 2).await.unwrap();
    let totals = sync.add(product("throw", 4500), 1).await.unwrap();
    assert_eq!(totals.count, 4);
    assert_eq!(totals.total, Money::from_cents(7500));

    // Quantities below one clamp rather than remove.
    let totals = sync.set_quantity(&ProductId::new("mug"), 0).await.unwrap();
    assert_eq!(totals.count, 2);

    let totals = sync.remove(&ProductId::new("throw")).await.unwrap();
    assert_eq!(totals.count, 1);

    let server = ctx.api.cart(&record.token, record.user_id).await.unwrap();
    assert_eq!(server.count, 1);
    assert_eq!(server.total, Money::from_cents(1000));

    // A second device sees the same cart after pulling.
    let other_device = memory_shop();
    sign_in(
        &ctx.api,
        &other_device,
        &login_form("ann@example.com", "hunter2222", false),
    )
    .await
    .unwrap();
    let pulled = CartSync::new(&ctx.api, &other_device).pull().await.unwrap();
    assert_eq!(pulled.count, 1);
    assert_eq!(
        other_device.cart().cart().unwrap().lines()[0].image_ref,
        "mug.png"
    );
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_records_order_and_clears_cart() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = memory_shop();
    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", true),
    )
    .await
    .unwrap();
    let sync = CartSync::new(&ctx.api, &shop);

    sync.add(product("mug", 1000), 2).await.unwrap();
    let order = sync
        .checkout(&CartSync::checkout_key(), Utc::now())
        .await
        .unwrap();
    assert_eq!(order.total, Money::from_cents(2000));
    assert_eq!(order.item_count(), 2);

    assert!(shop.cart().cart().unwrap().is_empty());
    assert_eq!(shop.orders().orders().unwrap()[0].id, order.id);

    let server_orders = ctx.api.orders(&record.token, record.user_id).await.unwrap();
    assert_eq!(server_orders.len(), 1);
    assert_eq!(server_orders[0].id, order.id);

    // The server cart is empty now, so a new submission fails.
    let err = sync
        .checkout(&CartSync::checkout_key(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Api(ref e) if e.status() == Some(422)));
}

#[tokio::test]
async fn test_checkout_replays_same_idempotency_key() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = memory_shop();
    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", true),
    )
    .await
    .unwrap();
    CartSync::new(&ctx.api, &shop)
        .add(product("throw", 4500), 1)
        .await
        .unwrap();

    let (first, created) = ctx
        .api
        .checkout(&record.token, record.user_id, Some("retry-1"))
        .await
        .unwrap();
    assert!(created);

    let (second, created) = ctx
        .api
        .checkout(&record.token, record.user_id, Some("retry-1"))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(second, first);

    let orders = ctx.api.orders(&record.token, record.user_id).await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn test_cart_sync_retry_with_same_key_returns_same_order() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = memory_shop();
    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", true),
    )
    .await
    .unwrap();
    let sync = CartSync::new(&ctx.api, &shop);
    sync.add(product("throw", 4500), 1).await.unwrap();

    let key = CartSync::checkout_key();
    let first = sync.checkout(&key, Utc::now()).await.unwrap();
    let retried = sync.checkout(&key, Utc::now()).await.unwrap();
    assert_eq!(retried, first);

    let server_orders = ctx.api.orders(&record.token, record.user_id).await.unwrap();
    assert_eq!(server_orders.len(), 1);
    assert_eq!(shop.orders().orders().unwrap(), vec![first]);
}

/// Durable tier that reads fine but refuses every write.
#[derive(Default)]
struct ReadOnlyTier(MemoryTier);

impl StorageTier for ReadOnlyTier {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io {
            path: PathBuf::from("read-only"),
            source: std::io::Error::other("disk full"),
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.0.keys()
    }
}

#[tokio::test]
async fn test_server_checkout_succeeds_when_local_writes_fail() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;

    let shop = Shop::new(Arc::new(ReadOnlyTier::default()), Arc::new(MemoryTier::new()));
    // Not remembered, so the sign-in lives in the writable session tier.
    let record = sign_in(
        &ctx.api,
        &shop,
        &login_form("ann@example.com", "hunter2222", false),
    )
    .await
    .unwrap();
    ctx.api
        .add_to_cart(
            &record.token,
            record.user_id,
            &AddToCartRequest::new(product("mug", 1000), Some(3)),
        )
        .await
        .unwrap();

    let order = CartSync::new(&ctx.api, &shop)
        .checkout(&CartSync::checkout_key(), Utc::now())
        .await
        .unwrap();
    assert_eq!(order.total, Money::from_cents(3000));

    let server_orders = ctx.api.orders(&record.token, record.user_id).await.unwrap();
    assert_eq!(server_orders.len(), 1);
    assert_eq!(server_orders[0].id, order.id);
    assert!(shop.orders().orders().unwrap().is_empty());
}

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
async fn test_cannot_touch_another_users_cart() {
    let ctx = TestContext::start().await;
    ctx.register("Ann", "Lee", "ann@example.com", "hunter2222").await;
    ctx.register("Bob", "Ray", "bob@example.com", "hunter3333").await;

    let ann = sign_in(
        &ctx.api,
        &memory_shop(),
        &login_form("ann@example.com", "hunter2222", false),
    )
    .await
    .unwrap();
    let bob = sign_in(
        &ctx.api,
        &memory_shop(),
        &login_form("bob@example.com", "hunter3333", false),
    )
    .await
    .unwrap();

    let err = ctx.api.cart(&bob.token, ann.user_id).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let forged = SecretString::from("not.a.token");
    let err = ctx.api.cart(&forged, ann.user_id).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let resp = reqwest::get(format!("{}/api/cart/{}", ctx.base_url(), ann.user_id))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Authorization token required");
}
