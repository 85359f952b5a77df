//! Typed client for the storefront REST API.

use std::time::Duration;

use comfycart_core::api::{
    AddToCartRequest, CartView, EditProfileRequest, ErrorBody, IDEMPOTENCY_KEY_HEADER,
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SetQuantityRequest, UserView,
};
use comfycart_core::{Order, ProductId, UserId};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl ApiClientBuilder {
    /// Per-request timeout (default 30 seconds).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(self.base_url));
        }
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(ApiClient { http, base_url })
    }
}

/// REST API client.
///
/// One request per call: no retries, no caching. Authenticated calls take
/// the bearer token explicitly so the client holds no session state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Start building a client for the API rooted at `base_url`.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Client with default settings.
    ///
    /// # Errors
    ///
    /// See [`ApiClientBuilder::build`].
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(base_url).build()
    }

    /// URL of `segments` below the base URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn user_segment(id: UserId) -> String {
        id.to_string()
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_else(|_| ErrorBody {
            message: if text.is_empty() {
                status.canonical_reason().unwrap_or("error").to_owned()
            } else {
                text
            },
            errors: Vec::new(),
        });
        tracing::debug!(status = status.as_u16(), message = %body.message, "API error response");
        Err(ApiError::Api {
            status: status.as_u16(),
            message: body.message,
            errors: body.errors,
        })
    }

    /// `POST /api/user/register`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 422 for rejected input.
    pub async fn register(&self, req: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&["api", "user", "register"])?;
        Self::send(self.http.post(url).json(req)).await
    }

    /// `POST /api/user/login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 422 for bad credentials.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["api", "user", "login"])?;
        Self::send(self.http.post(url).json(req)).await
    }

    /// `GET /api/user/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn users(&self) -> Result<Vec<UserView>, ApiError> {
        let url = self.endpoint(&["api", "user", ""])?;
        Self::send(self.http.get(url)).await
    }

    /// `GET /api/user/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 404 for an unknown user.
    pub async fn user(&self, id: UserId) -> Result<UserView, ApiError> {
        let url = self.endpoint(&["api", "user", &Self::user_segment(id)])?;
        Self::send(self.http.get(url)).await
    }

    /// `PATCH /api/user/edit`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401, 404 or 422.
    pub async fn edit_profile(
        &self,
        token: &SecretString,
        req: &EditProfileRequest,
    ) -> Result<UserView, ApiError> {
        let url = self.endpoint(&["api", "user", "edit"])?;
        Self::send(
            self.http
                .patch(url)
                .bearer_auth(token.expose_secret())
                .json(req),
        )
        .await
    }

    /// `GET /api/cart/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401 or 403.
    pub async fn cart(&self, token: &SecretString, user: UserId) -> Result<CartView, ApiError> {
        let url = self.endpoint(&["api", "cart", &Self::user_segment(user)])?;
        Self::send(self.http.get(url).bearer_auth(token.expose_secret())).await
    }

    /// `POST /api/cart/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401, 403 or 422.
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        user: UserId,
        req: &AddToCartRequest,
    ) -> Result<CartView, ApiError> {
        let url = self.endpoint(&["api", "cart", &Self::user_segment(user)])?;
        Self::send(
            self.http
                .post(url)
                .bearer_auth(token.expose_secret())
                .json(req),
        )
        .await
    }

    /// `PATCH /api/cart/{userId}/{productId}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401, 403 or 422.
    pub async fn set_quantity(
        &self,
        token: &SecretString,
        user: UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartView, ApiError> {
        let url = self.endpoint(&[
            "api",
            "cart",
            &Self::user_segment(user),
            product_id.as_str(),
        ])?;
        Self::send(
            self.http
                .patch(url)
                .bearer_auth(token.expose_secret())
                .json(&SetQuantityRequest { quantity }),
        )
        .await
    }

    /// `DELETE /api/cart/{userId}/{productId}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401 or 403.
    pub async fn remove_from_cart(
        &self,
        token: &SecretString,
        user: UserId,
        product_id: &ProductId,
    ) -> Result<CartView, ApiError> {
        let url = self.endpoint(&[
            "api",
            "cart",
            &Self::user_segment(user),
            product_id.as_str(),
        ])?;
        Self::send(self.http.delete(url).bearer_auth(token.expose_secret())).await
    }

    /// `DELETE /api/cart/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401 or 403.
    pub async fn clear_cart(&self, token: &SecretString, user: UserId) -> Result<CartView, ApiError> {
        let url = self.endpoint(&["api", "cart", &Self::user_segment(user)])?;
        Self::send(self.http.delete(url).bearer_auth(token.expose_secret())).await
    }

    /// `POST /api/cart/{userId}/checkout`.
    ///
    /// Returns the order and whether the server created it (`false` when an
    /// earlier checkout with the same `idempotency_key` was replayed).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 422 for an empty cart.
    pub async fn checkout(
        &self,
        token: &SecretString,
        user: UserId,
        idempotency_key: Option<&str>,
    ) -> Result<(Order, bool), ApiError> {
        let url = self.endpoint(&["api", "cart", &Self::user_segment(user), "checkout"])?;
        let mut request = self.http.post(url).bearer_auth(token.expose_secret());
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        let response = request.send().await?;
        let created = response.status() == StatusCode::CREATED;
        let order = Self::decode(response).await?;
        Ok((order, created))
    }

    /// `GET /api/orders/{userId}`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 401 or 403.
    pub async fn orders(&self, token: &SecretString, user: UserId) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["api", "orders", &Self::user_segment(user)])?;
        Self::send(self.http.get(url).bearer_auth(token.expose_secret())).await
    }

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers with a success status.
    pub async fn health(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["health"])?;
        let response = self.http.get(url).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Self::decode::<serde_json::Value>(response).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_and_encodes_segments() {
        let client = ApiClient::new("http://localhost:5000").unwrap();
        let url = client.endpoint(&["api", "cart", "7", "mug/blue"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/cart/7/mug%2Fblue");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/shop/").unwrap();
        let url = client.endpoint(&["api", "user", ""]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/shop/api/user/");
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::InvalidBaseUrl(_))));
    }
}
