//! Form validation.
//!
//! Each form validates into either a typed value ready to send or store, or
//! the [`ValidationErrors`] to show next to the fields.

use comfycart_core::api::{LoginRequest, MIN_PASSWORD_LEN, RegisterRequest};
use comfycart_core::{Email, ValidationErrors};

/// Minimum password length the login form accepts before contacting the server.
pub const LOGIN_MIN_PASSWORD_LEN: usize = 6;

const INVALID_EMAIL: &str = "Please enter a valid email";

fn check_email(errors: &mut ValidationErrors, raw: &str) -> Option<Email> {
    if raw.trim().is_empty() {
        errors.add("email", "Email is required");
        return None;
    }
    match Email::parse(raw) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.add("email", INVALID_EMAIL);
            None
        }
    }
}

fn require(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
        return false;
    }
    true
}

/// Sign-in form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns the failing fields: missing or malformed `email`, missing or
    /// short `password`.
    pub fn validate(&self) -> Result<LoginRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = check_email(&mut errors, &self.email);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < LOGIN_MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {LOGIN_MIN_PASSWORD_LEN} characters"),
            );
        }

        match email {
            Some(email) if errors.is_empty() => Ok(LoginRequest {
                email: email.into_inner(),
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Account creation form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
}

impl SignupForm {
    /// # Errors
    ///
    /// Returns every failing field. The password rule matches the server's.
    pub fn validate(&self) -> Result<RegisterRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "firstName", "First name", &self.first_name);
        require(&mut errors, "lastName", "Last name", &self.last_name);
        let email = check_email(&mut errors, &self.email);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.trim().chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }

        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords do not match");
        }

        if !self.agree_terms {
            errors.add("agreeTerms", "You must agree to the terms and conditions");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(RegisterRequest {
                name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
                email: email.into_inner(),
                password: self.password.clone(),
                password2: self.confirm_password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Shipping and payment form shown at checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub card_number: String,
    pub name_on_card: String,
    /// `MM/YY`.
    pub expiry: String,
    pub cvv: String,
}

/// A validated checkout form. Only the last four card digits are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub name_on_card: String,
    pub card_last_four: String,
    pub expiry_month: u8,
    pub expiry_year: u8,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Parse `MM/YY` with a month in 1-12.
fn parse_expiry(raw: &str) -> Option<(u8, u8)> {
    let (mm, yy) = raw.trim().split_once('/')?;
    if mm.len() != 2 || yy.len() != 2 || !all_digits(mm) || !all_digits(yy) {
        return None;
    }
    let month: u8 = mm.parse().ok()?;
    let year: u8 = yy.parse().ok()?;
    (1..=12).contains(&month).then_some((month, year))
}

impl CheckoutForm {
    /// # Errors
    ///
    /// Returns every failing field. All fields are required.
    pub fn validate(&self) -> Result<CheckoutDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "firstName", "First name", &self.first_name);
        require(&mut errors, "lastName", "Last name", &self.last_name);
        let email = check_email(&mut errors, &self.email);
        require(&mut errors, "address", "Address", &self.address);
        require(&mut errors, "city", "City", &self.city);
        require(&mut errors, "state", "State", &self.state);
        require(&mut errors, "zip", "ZIP code", &self.zip);
        require(&mut errors, "nameOnCard", "Name on card", &self.name_on_card);

        let digits: String = self.card_number.chars().filter(|c| *c != ' ').collect();
        if require(&mut errors, "cardNumber", "Card number", &self.card_number)
            && (!all_digits(&digits) || !(12..=19).contains(&digits.len()))
        {
            errors.add("cardNumber", "Please enter a valid card number");
        }

        let expiry = parse_expiry(&self.expiry);
        if require(&mut errors, "expiry", "Expiry date", &self.expiry) && expiry.is_none() {
            errors.add("expiry", "Expiry must be in MM/YY format");
        }

        let cvv = self.cvv.trim();
        if require(&mut errors, "cvv", "CVV", cvv) && (!all_digits(cvv) || !(3..=4).contains(&cvv.len())) {
            errors.add("cvv", "CVV must be 3 or 4 digits");
        }

        match (email, expiry) {
            (Some(email), Some((expiry_month, expiry_year))) if errors.is_empty() => {
                let card_last_four = digits
                    .get(digits.len().saturating_sub(4)..)
                    .unwrap_or_default()
                    .to_owned();
                Ok(CheckoutDetails {
                    first_name: self.first_name.trim().to_owned(),
                    last_name: self.last_name.trim().to_owned(),
                    email,
                    address: self.address.trim().to_owned(),
                    city: self.city.trim().to_owned(),
                    state: self.state.trim().to_owned(),
                    zip: self.zip.trim().to_owned(),
                    name_on_card: self.name_on_card.trim().to_owned(),
                    card_last_four,
                    expiry_month,
                    expiry_year,
                })
            }
            _ => Err(errors),
        }
    }
}
