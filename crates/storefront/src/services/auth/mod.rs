//! Account service: registration, password login and profile edits.
//!
//! Validation follows the order the REST API documents, so the first failing
//! rule decides the response message.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenSigner};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use comfycart_core::api::{EditProfileRequest, LoginRequest, MIN_PASSWORD_LEN, RegisterRequest};
use comfycart_core::{Email, UserId, ValidationErrors};

use crate::db::{RepositoryError, UserRepository};
use crate::models::{ProfileUpdate, User};

const FILL_ALL_FIELDS: &str = "Fill in all fields";
const WEAK_PASSWORD: &str = "Password should be at least 8 characters";

/// Account service over a [`UserRepository`].
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for missing fields, an invalid or
    /// already registered email, a short password or mismatched passwords.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn register(&self, req: &RegisterRequest) -> Result<User, AuthError> {
        require_fields(
            &[
                ("name", req.name.as_str()),
                ("email", req.email.as_str()),
                ("password", req.password.as_str()),
                ("password2", req.password2.as_str()),
            ],
            FILL_ALL_FIELDS,
        )?;

        let email = parse_email(&req.email)?;
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(ValidationErrors::single("email", "Email already registered").into());
        }

        validate_password("password", req.password.as_str())?;
        if req.password != req.password2 {
            return Err(ValidationErrors::single("password2", "Passwords do not match").into());
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(req.name.trim(), &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    ValidationErrors::single("email", "Email already registered").into()
                }
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when a field is missing and
    /// `AuthError::InvalidCredentials` for an unknown email or wrong password.
    #[instrument(skip_all)]
    pub async fn login(&self, req: &LoginRequest) -> Result<User, AuthError> {
        require_fields(
            &[("email", req.email.as_str()), ("password", req.password.as_str())],
            "Please fill in missing fields",
        )?;

        let email = Email::parse(&req.email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&req.password, &user.password_hash)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    /// Update the name, email and optionally the password of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account is gone and
    /// `AuthError::Validation` for missing fields, an email owned by another
    /// account, a wrong current password or a bad new password.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn edit_profile(
        &self,
        user_id: UserId,
        req: &EditProfileRequest,
    ) -> Result<User, AuthError> {
        require_fields(
            &[
                ("name", req.name.as_str()),
                ("email", req.email.as_str()),
                ("currPassword", req.curr_password.as_str()),
            ],
            FILL_ALL_FIELDS,
        )?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let email = parse_email(&req.email)?;
        if let Some(owner) = self.users.get_by_email(&email).await?
            && owner.id != user.id
        {
            return Err(ValidationErrors::single("email", "Email already exists").into());
        }

        verify_password(&req.curr_password, &user.password_hash).map_err(|_| {
            AuthError::from(ValidationErrors::single(
                "currPassword",
                "Invalid current password",
            ))
        })?;

        let new_password = req.new_password.as_deref().unwrap_or_default();
        let confirm = req.confirm_new_password.as_deref().unwrap_or_default();
        let password_hash = if new_password.is_empty() && confirm.is_empty() {
            None
        } else {
            if new_password != confirm {
                return Err(ValidationErrors::single(
                    "confirmNewPassword",
                    "New passwords do not match",
                )
                .into());
            }
            validate_password("newPassword", new_password)?;
            Some(hash_password(new_password)?)
        };

        let update = ProfileUpdate {
            name: req.name.trim().to_owned(),
            email,
            password_hash,
        };
        let updated = self
            .users
            .update_profile(user.id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    ValidationErrors::single("email", "Email already exists").into()
                }
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %updated.id, "profile updated");
        Ok(updated)
    }
}

/// Fail with `message` against every blank field.
fn require_fields(fields: &[(&str, &str)], message: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for (name, value) in fields {
        if value.trim().is_empty() {
            errors.add(name, message);
        }
    }
    errors.into_result(())
}

fn parse_email(raw: &str) -> Result<Email, ValidationErrors> {
    Email::parse(raw).map_err(|_| ValidationErrors::single("email", "Invalid email address"))
}

fn validate_password(field: &str, password: &str) -> Result<(), ValidationErrors> {
    if password.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationErrors::single(field, WEAK_PASSWORD));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
