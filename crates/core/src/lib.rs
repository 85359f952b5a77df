//! ComfyCart Core - Shared domain types.
//!
//! This crate provides the types and rules used across all ComfyCart components:
//! - `client` - Client-side session, cart, wishlist and review state
//! - `storefront` - REST backend for accounts and the server-side cart
//! - `cli` - Command-line tools for schema and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no database
//! access, no HTTP clients. Cart arithmetic and order materialization live here
//! so the client cache and the authoritative server cart agree by construction.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, money and identity keys
//! - [`cart`] - Cart lines, totals and order materialization
//! - [`order`] - Immutable order snapshots
//! - [`wishlist`] - Wishlist membership
//! - [`review`] - Product reviews and their aggregation
//! - [`validation`] - Field-level validation results
//! - [`api`] - Request and response bodies of the REST API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod order;
pub mod review;
pub mod types;
pub mod validation;
pub mod wishlist;

pub use cart::{Cart, CartLine, EmptyCartError, MaterializeError, ProductSnapshot, Totals};
pub use order::Order;
pub use review::{Rating, Review, ReviewDraft, ReviewSummary};
pub use types::*;
pub use validation::{FieldError, ValidationErrors};
pub use wishlist::{Wishlist, WishlistEntry};
