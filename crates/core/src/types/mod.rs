//! Core types for ComfyCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod money;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::IdentityKey;
pub use money::{Money, MoneyError};
