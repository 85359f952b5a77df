//! Authentication state and identity resolution.
//!
//! [`SessionService`] is the only component that knows where the auth record
//! lives. Stores ask it for the current [`IdentityKey`] on every access, so a
//! sign-in or sign-out re-keys every collection at once.

use std::sync::Arc;

use comfycart_core::{Email, IdentityKey, UserId};
use secrecy::{ExposeSecret, SecretString};

use crate::error::StorageError;
use crate::storage::StorageTier;

const TOKEN_KEY: &str = "token";
const USER_ID_KEY: &str = "userId";
const USER_NAME_KEY: &str = "userName";
const USER_EMAIL_KEY: &str = "userEmail";

const AUTH_KEYS: [&str; 4] = [TOKEN_KEY, USER_ID_KEY, USER_NAME_KEY, USER_EMAIL_KEY];

/// What a successful sign-in leaves in storage.
#[derive(Debug, Clone)]
pub struct AuthRecord {
    pub token: SecretString,
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
}

impl AuthRecord {
    /// Identity key derived from the record's email.
    #[must_use]
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::for_email(&self.email)
    }
}

/// Reads and writes the auth record across the two storage tiers.
#[derive(Clone)]
pub struct SessionService {
    durable: Arc<dyn StorageTier>,
    session: Arc<dyn StorageTier>,
}

impl SessionService {
    #[must_use]
    pub fn new(durable: Arc<dyn StorageTier>, session: Arc<dyn StorageTier>) -> Self {
        Self { durable, session }
    }

    /// The tier that survives restarts.
    #[must_use]
    pub fn durable(&self) -> &dyn StorageTier {
        self.durable.as_ref()
    }

    /// The tier scoped to one browsing session.
    #[must_use]
    pub fn session(&self) -> &dyn StorageTier {
        self.session.as_ref()
    }

    /// The signed-in user, preferring the durable tier.
    ///
    /// A tier holding a token without a usable user id or email does not
    /// count as signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if a tier cannot be read.
    pub fn current(&self) -> Result<Option<AuthRecord>, StorageError> {
        for (tier_name, tier) in [("durable", self.durable()), ("session", self.session())] {
            if let Some(record) = read_record(tier_name, tier)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// The identity every store should use right now.
    ///
    /// # Errors
    ///
    /// Returns an error if a tier cannot be read.
    pub fn resolve(&self) -> Result<IdentityKey, StorageError> {
        Ok(self
            .current()?
            .map_or_else(IdentityKey::guest, |record| record.identity()))
    }

    /// Record a sign-in.
    ///
    /// With `remember_me` the record goes to the durable tier, otherwise to
    /// the session tier. Any record in the other tier is removed, so exactly
    /// one tier holds credentials afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if a tier cannot be written.
    pub fn sign_in(&self, record: &AuthRecord, remember_me: bool) -> Result<(), StorageError> {
        let (target, other) = if remember_me {
            (self.durable(), self.session())
        } else {
            (self.session(), self.durable())
        };

        clear_record(other)?;
        target.set(TOKEN_KEY, record.token.expose_secret())?;
        target.set(USER_ID_KEY, &record.user_id.to_string())?;
        target.set(USER_NAME_KEY, &record.name)?;
        target.set(USER_EMAIL_KEY, record.email.as_str())?;

        tracing::info!(user_id = %record.user_id, remember_me, "Signed in");
        Ok(())
    }

    /// Remove the auth record from both tiers.
    ///
    /// Collections stay where they are; the guest identity simply stops
    /// seeing them.
    ///
    /// # Errors
    ///
    /// Returns an error if a tier cannot be written.
    pub fn sign_out(&self) -> Result<(), StorageError> {
        clear_record(self.durable())?;
        clear_record(self.session())?;
        tracing::info!("Signed out");
        Ok(())
    }
}

fn read_record(tier_name: &str, tier: &dyn StorageTier) -> Result<Option<AuthRecord>, StorageError> {
    let Some(token) = tier.get(TOKEN_KEY)?.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let email = tier
        .get(USER_EMAIL_KEY)?
        .and_then(|raw| Email::parse(&raw).ok());
    let user_id = tier
        .get(USER_ID_KEY)?
        .and_then(|raw| raw.parse::<UserId>().ok());

    let (Some(email), Some(user_id)) = (email, user_id) else {
        tracing::warn!(tier = tier_name, "Ignoring auth record without a valid user id and email");
        return Ok(None);
    };

    Ok(Some(AuthRecord {
        token: SecretString::from(token),
        user_id,
        name: tier.get(USER_NAME_KEY)?.unwrap_or_default(),
        email,
    }))
}

fn clear_record(tier: &dyn StorageTier) -> Result<(), StorageError> {
    for key in AUTH_KEYS {
        tier.remove(key)?;
    }
    Ok(())
}
