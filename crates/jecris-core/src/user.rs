//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::UserId;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID.
    pub id: UserId,

    /// Login email, stored lowercased.
    pub email: String,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email.
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
}

impl NewUser {
    /// Build a new user from a raw email and a password hash.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the email is not syntactically valid.
    pub fn new(email: &str, password_hash: String) -> Result<Self> {
        Ok(Self {
            email: normalize_email(email)?,
            password_hash,
        })
    }
}

/// Trim and lowercase an email, rejecting anything that does not look like
/// `local@domain.tld`.
///
/// # Errors
///
/// Returns `CoreError::Validation` for empty or malformed addresses.
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let invalid = |reason: &str| CoreError::Validation {
        field: "email",
        reason: reason.to_string(),
    };

    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("email must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("email must contain '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("email is not valid"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid("email domain is not valid"));
    }

    Ok(email)
}

/// Check a plaintext password against the registration rules.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the password is too short.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation {
            field: "password",
            reason: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        });
    }
    Ok(())
}
