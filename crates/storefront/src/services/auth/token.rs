//! Bearer tokens: compact HS256 JWTs.
//!
//! `base64url(header) . base64url(claims) . base64url(hmac_sha256(secret, header.claims))`
//!
//! Only HS256 is produced or accepted. The signature is checked with
//! `Mac::verify_slice` (constant time) before the claims are parsed.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use comfycart_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// The only JOSE header this service issues.
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Errors from issuing or checking a bearer token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No `Authorization: Bearer` header.
    #[error("Authorization token required")]
    Missing,

    /// Malformed token, wrong algorithm or bad signature.
    #[error("Invalid token")]
    Invalid,

    /// Signature is valid but `exp` has passed.
    #[error("Token expired")]
    Expired,

    /// The signing key could not be used.
    #[error("token signing key rejected")]
    Key,

    /// Claims could not be serialized.
    #[error("token encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    /// Display name at the time of login.
    pub name: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The user this token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// Issues and verifies bearer tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: chrono::Duration,
}

impl TokenSigner {
    #[must_use]
    pub const fn new(secret: SecretString, ttl: chrono::Duration) -> Self {
        Self { secret, ttl }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }

    /// Issue a token for `user_id` valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` or `TokenError::Encode` if signing fails.
    pub fn issue(
        &self,
        user_id: UserId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let header = URL_SAFE_NO_PAD.encode(HEADER_JSON);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Check a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for anything malformed or wrongly signed
    /// and `TokenError::Expired` once `exp` is not after `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let Some((signing_input, signature)) = token.rsplit_once('.') else {
            return Err(TokenError::Invalid);
        };
        let Some((header, payload)) = signing_input.split_once('.') else {
            return Err(TokenError::Invalid);
        };
        if payload.contains('.') {
            return Err(TokenError::Invalid);
        }

        let header: Header = decode_json(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::Invalid);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Invalid)?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let claims: Claims = decode_json(payload)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}
