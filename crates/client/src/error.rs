//! Error types of the client-side engine.

use std::path::PathBuf;

use comfycart_core::{EmptyCartError, FieldError, MaterializeError, MoneyError, ValidationErrors};
use thiserror::Error;

/// A storage tier could not be read or written.
///
/// Absence is never an error: a missing key reads as `None` and a missing
/// collection as empty.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backing file exists but is not a JSON object of strings.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Another thread panicked while holding the tier lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Errors returned by the REST API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    /// The configured base URL cannot carry path segments.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status of an error response, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(_) | Self::InvalidBaseUrl(_) => None,
        }
    }
}

/// Errors from changing the cart.
#[derive(Debug, Error)]
pub enum CartError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The cart total would not fit; nothing was written.
    #[error("cart total cannot be computed: {0}")]
    Total(#[from] MoneyError),
}

/// Errors from checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    EmptyCart(#[from] EmptyCartError),

    #[error("cart total cannot be computed: {0}")]
    Total(#[from] MoneyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The server refused or failed the checkout.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<MaterializeError> for CheckoutError {
    fn from(err: MaterializeError) -> Self {
        match err {
            MaterializeError::Empty(e) => Self::EmptyCart(e),
            MaterializeError::Total(e) => Self::Total(e),
        }
    }
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Storage(e) => Self::Storage(e),
            CartError::Total(e) => Self::Total(e),
        }
    }
}

/// Errors from adding a review.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("invalid review: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the login flow.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The form failed local validation; nothing was sent.
    #[error("invalid login form: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from synchronizing with the server cart.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
