//! Handler tests driving the full router over in-memory repositories.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::StorefrontConfig;
use crate::state::AppState;

const SECRET: &str = "kX9#mQ2$vL7@pR4!wN8&zT3*bY6^cH1%";

fn test_app() -> axum::Router {
    crate::app(AppState::in_memory(StorefrontConfig::in_memory(
        SecretString::from(SECRET),
    )))
}

async fn call(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register and log in, returning `(token, user_id)`.
async fn sign_up(app: &axum::Router, name: &str, email: &str) -> (String, i64) {
    let response = call(
        app,
        Method::POST,
        "/api/user/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "password1",
            "password2": "password1",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = call(
        app,
        Method::POST,
        "/api/user/login",
        None,
        Some(json!({ "email": email, "password": "password1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    (
        body["token"].as_str().unwrap().to_owned(),
        body["id"].as_i64().unwrap(),
    )
}

fn mug(quantity: Option<i64>) -> Value {
    let mut body = json!({
        "productId": "mug",
        "title": "Mug",
        "unitPrice": "10.00",
        "imageRef": "mug.png",
    });
    if let Some(q) = quantity {
        body["quantity"] = json!(q);
    }
    body
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = test_app();
    let response = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = call(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation_messages() {
    let app = test_app();
    let register = |body: Value| call(&app, Method::POST, "/api/user/register", None, Some(body));

    let response = register(json!({ "name": "Ann" })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "Fill in all fields");

    let response = register(json!({
        "name": "Ann", "email": "ann@example.com", "password": "pass", "password2": "pass"
    }))
    .await;
    assert_eq!(
        json_body(response).await["message"],
        "Password should be at least 8 characters"
    );

    let response = register(json!({
        "name": "Ann", "email": "ann@example.com", "password": "password1", "password2": "password2"
    }))
    .await;
    assert_eq!(json_body(response).await["message"], "Passwords do not match");

    sign_up(&app, "Ann", "ann@example.com").await;
    let response = register(json!({
        "name": "Ann", "email": "ANN@example.com", "password": "password1", "password2": "password1"
    }))
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "Email already registered");
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/user/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["message"].is_string());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = test_app();
    sign_up(&app, "Ann", "ann@example.com").await;

    let response = call(
        &app,
        Method::POST,
        "/api/user/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(response).await["message"],
        "You have entered an invalid username or password"
    );

    let response = call(
        &app,
        Method::POST,
        "/api/user/login",
        None,
        Some(json!({ "email": "ann@example.com" })),
    )
    .await;
    assert_eq!(
        json_body(response).await["message"],
        "Please fill in missing fields"
    );
}

#[tokio::test]
async fn test_user_listing_hides_password_and_404s() {
    let app = test_app();
    let (_, id) = sign_up(&app, "Ann", "ann@example.com").await;

    for uri in ["/api/user", "/api/user/"] {
        let response = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let users = json_body(response).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert!(users[0].get("password").is_none());
        assert!(users[0].get("passwordHash").is_none());
    }

    let response = call(&app, Method::GET, &format!("/api/user/{id}"), None, None).await;
    assert_eq!(json_body(response).await["email"], "ann@example.com");

    for uri in ["/api/user/999", "/api/user/not-an-id"] {
        let response = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "User not found");
    }
}

#[tokio::test]
async fn test_edit_requires_token() {
    let app = test_app();
    let edit = json!({ "name": "Ann", "email": "ann@example.com", "currPassword": "password1" });

    let response = call(&app, Method::PATCH, "/api/user/edit", None, Some(edit.clone())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["message"],
        "Authorization token required"
    );

    let response = call(&app, Method::PATCH, "/api/user/edit", Some("garbage"), Some(edit)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Invalid token");
}

#[tokio::test]
async fn test_edit_profile_updates_user() {
    let app = test_app();
    let (token, _) = sign_up(&app, "Ann", "ann@example.com").await;
    sign_up(&app, "Bob", "bob@example.com").await;

    let response = call(
        &app,
        Method::PATCH,
        "/api/user/edit",
        Some(&token),
        Some(json!({ "name": "Ann", "email": "bob@example.com", "currPassword": "password1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "Email already exists");

    let response = call(
        &app,
        Method::PATCH,
        "/api/user/edit",
        Some(&token),
        Some(json!({ "name": "Ann Lee", "email": "ann@example.com", "currPassword": "password1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Ann Lee");
}

#[tokio::test]
async fn test_cart_flow_and_checkout() {
    let app = test_app();
    let (token, id) = sign_up(&app, "Ann", "ann@example.com").await;
    let cart_uri = format!("/api/cart/{id}");

    let response = call(&app, Method::GET, &cart_uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["count"], 0);

    call(&app, Method::POST, &cart_uri, Some(&token), Some(mug(None))).await;
    let response = call(&app, Method::POST, &cart_uri, Some(&token), Some(mug(None))).await;
    let cart = json_body(response).await;
    assert_eq!(cart["count"], 2);
    assert_eq!(cart["total"], "20.00");
    assert_eq!(cart["lines"].as_array().unwrap().len(), 1);

    let response = call(
        &app,
        Method::PATCH,
        &format!("{cart_uri}/mug"),
        Some(&token),
        Some(json!({ "quantity": 5 })),
    )
    .await;
    let cart = json_body(response).await;
    assert_eq!(cart["count"], 5);
    assert_eq!(cart["total"], "50.00");

    let response = call(
        &app,
        Method::PATCH,
        &format!("{cart_uri}/mug"),
        Some(&token),
        Some(json!({ "quantity": -3 })),
    )
    .await;
    assert_eq!(json_body(response).await["count"], 1);

    call(
        &app,
        Method::PATCH,
        &format!("{cart_uri}/mug"),
        Some(&token),
        Some(json!({ "quantity": 5 })),
    )
    .await;

    let response = call(
        &app,
        Method::POST,
        &format!("{cart_uri}/checkout"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = json_body(response).await;
    assert_eq!(order["total"], "50.00");
    assert_eq!(order["lines"][0]["quantity"], 5);

    let response = call(&app, Method::GET, &cart_uri, Some(&token), None).await;
    assert_eq!(json_body(response).await["count"], 0);

    let response = call(
        &app,
        Method::POST,
        &format!("{cart_uri}/checkout"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "Cart is empty");

    let response = call(
        &app,
        Method::GET,
        &format!("/api/orders/{id}"),
        Some(&token),
        None,
    )
    .await;
    let orders = json_body(response).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["orderId"], order["orderId"]);
}

#[tokio::test]
async fn test_add_rejects_non_positive_quantity() {
    let app = test_app();
    let (token, id) = sign_up(&app, "Ann", "ann@example.com").await;

    let response = call(
        &app,
        Method::POST,
        &format!("/api/cart/{id}"),
        Some(&token),
        Some(mug(Some(0))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = call(
        &app,
        Method::POST,
        &format!("/api/cart/{id}"),
        Some(&token),
        Some(mug(Some(3))),
    )
    .await;
    assert_eq!(json_body(response).await["count"], 3);
}

#[tokio::test]
async fn test_total_overflow_is_refused_and_cart_kept() {
    let app = test_app();
    let (token, id) = sign_up(&app, "Ann", "ann@example.com").await;
    let cart_uri = format!("/api/cart/{id}");

    let response = call(&app, Method::POST, &cart_uri, Some(&token), Some(mug(Some(1)))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let huge = json!({
        "productId": "vault",
        "title": "Vault",
        "unitPrice": "79228162514264337593543950335",
        "quantity": 2,
    });
    let response = call(&app, Method::POST, &cart_uri, Some(&token), Some(huge)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "Cart total is too large");

    // Nothing was saved: the cart still holds only the mug and stays usable.
    let response = call(&app, Method::GET, &cart_uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], "10.00");

    // A single unit fits, but raising its quantity would not.
    let one = json!({
        "productId": "vault",
        "title": "Vault",
        "unitPrice": "79228162514264337593543950335",
    });
    let response = call(&app, Method::POST, &cart_uri, Some(&token), Some(one)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = call(
        &app,
        Method::PATCH,
        &format!("{cart_uri}/mug"),
        Some(&token),
        Some(json!({ "quantity": i64::MAX })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["count"], u32::MAX);

    let response = call(
        &app,
        Method::POST,
        &format!("{cart_uri}/checkout"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let app = test_app();
    let (token, id) = sign_up(&app, "Ann", "ann@example.com").await;
    let cart_uri = format!("/api/cart/{id}");

    call(&app, Method::POST, &cart_uri, Some(&token), Some(mug(Some(2)))).await;

    let response = call(
        &app,
        Method::DELETE,
        &format!("{cart_uri}/absent"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["count"], 2);

    let response = call(
        &app,
        Method::DELETE,
        &format!("{cart_uri}/mug"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(json_body(response).await["count"], 0);

    call(&app, Method::POST, &cart_uri, Some(&token), Some(mug(None))).await;
    let response = call(&app, Method::DELETE, &cart_uri, Some(&token), None).await;
    assert_eq!(json_body(response).await["count"], 0);
}

#[tokio::test]
async fn test_checkout_idempotency_key_replays_order() {
    let app = test_app();
    let (token, id) = sign_up(&app, "Ann", "ann@example.com").await;
    call(
        &app,
        Method::POST,
        &format!("/api/cart/{id}"),
        Some(&token),
        Some(mug(Some(2))),
    )
    .await;

    let checkout = || {
        app.clone().oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/cart/{id}/checkout"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header("idempotency-key", "order-attempt-1")
                .body(Body::empty())
                .unwrap(),
        )
    };

    let first = checkout().await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = json_body(first).await;

    let second = checkout().await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(second).await, first);

    let response = call(
        &app,
        Method::GET,
        &format!("/api/orders/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_users_cart_is_forbidden() {
    let app = test_app();
    let (ann_token, _) = sign_up(&app, "Ann", "ann@example.com").await;
    let (_, bob_id) = sign_up(&app, "Bob", "bob@example.com").await;

    for (method, uri) in [
        (Method::GET, format!("/api/cart/{bob_id}")),
        (Method::DELETE, format!("/api/cart/{bob_id}")),
        (Method::GET, format!("/api/orders/{bob_id}")),
        (Method::POST, format!("/api/cart/{bob_id}/checkout")),
    ] {
        let response = call(&app, method, &uri, Some(&ann_token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let response = call(&app, Method::GET, &format!("/api/cart/{bob_id}"), None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
