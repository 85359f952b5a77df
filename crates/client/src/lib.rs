//! ComfyCart Client - Client-side shopping state.
//!
//! Everything a storefront front end keeps between page views: who is signed
//! in, the cart, wishlist, reviews and order history, plus the forms that
//! feed them and a typed client for the REST backend.
//!
//! # Architecture
//!
//! State lives in two [`StorageTier`]s. The durable tier survives restarts
//! and holds carts, order logs and remembered sign-ins; the session tier
//! holds wishlists, reviews and one-off sign-ins. Every collection key is
//! `<collection>_<identity>`, where the identity comes from the single
//! [`SessionService`]. Signing in or out therefore switches every
//! collection without copying anything.
//!
//! # Modules
//!
//! - [`storage`] - Storage tier trait, in-memory and JSON file tiers
//! - [`session`] - Auth record and identity resolution
//! - [`stores`] - Cart, order, wishlist and review stores
//! - [`shop`] - The assembled engine and local checkout
//! - [`forms`] - Login, signup and checkout form validation
//! - [`api`] - REST API client
//! - [`sync`] - Sign-in flow and server cart synchronization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod error;
pub mod forms;
pub mod session;
pub mod shop;
pub mod storage;
pub mod stores;
pub mod sync;

pub use api::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, CartError, CheckoutError, LoginError, ReviewError, StorageError, SyncError};
pub use forms::{CheckoutDetails, CheckoutForm, LoginForm, SignupForm};
pub use session::{AuthRecord, SessionService};
pub use shop::{CheckoutSummary, Shop};
pub use storage::{JsonFileTier, MemoryTier, StorageTier};
pub use stores::{CartStore, OrderStore, ReviewStore, WishlistStore};
pub use sync::{CartSync, sign_in};
