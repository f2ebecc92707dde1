//! Input validation applied before any provider call

use error_types::{AuthError, AuthResult};
use once_cell::sync::Lazy;
use regex::Regex;

// Hardcoded pattern; a failure here is a source bug
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

pub const MIN_PASSWORD_LEN: usize = 6;

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Minimum length, counted in characters
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// [`validate_password`] as an `AuthError::WeakPassword`
pub fn check_password(password: &str) -> AuthResult<()> {
    if !validate_password(password) {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
