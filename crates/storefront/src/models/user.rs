//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use core::fmt;

use chrono::{DateTime, Utc};

use comfycart_core::api::UserView;
use comfycart_core::{Email, UserId};

/// A storefront account (domain type).
#[derive(Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized email address, unique across accounts.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public view of the account, without the password hash.
    #[must_use]
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// New values for `PATCH /api/user/edit`, already validated.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: Email,
    /// Replacement hash; `None` keeps the current password.
    pub password_hash: Option<String>,
}
