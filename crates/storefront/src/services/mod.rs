//! Business logic services for the storefront backend.
//!
//! - `auth` - Accounts, password hashing and bearer tokens

pub mod auth;
