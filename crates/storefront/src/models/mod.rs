//! Domain models for the storefront backend.

pub mod user;

pub use user::{ProfileUpdate, User};
