//! Identity keys used to namespace per-actor collections.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::email::Email;

/// Namespacing key for one actor's persisted collections.
///
/// A signed-in shopper is keyed by their normalized email; everyone else
/// shares the guest sentinel. Every collection key is derived from this value,
/// so switching actors switches every collection at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// The guest sentinel.
    pub const GUEST: &'static str = "guest";

    /// The key used when nobody is signed in.
    #[must_use]
    pub fn guest() -> Self {
        Self(Self::GUEST.to_owned())
    }

    /// The key of an authenticated shopper.
    #[must_use]
    pub fn for_email(email: &Email) -> Self {
        Self(email.as_str().to_owned())
    }

    /// Whether this is the guest sentinel.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == Self::GUEST
    }

    /// Storage key for a collection owned by this identity, e.g. `cart_guest`.
    #[must_use]
    pub fn namespaced(&self, collection: &str) -> String {
        format!("{collection}_{}", self.0)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
