use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CredentialError;

/// Minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("failed to compile email regex")
});

/// Check sign-in input before any request is made.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), CredentialError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(CredentialError::MissingFields);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(CredentialError::MalformedEmail);
    }
    Ok(())
}

/// Check registration input before any request is made.
pub fn validate_sign_up(email: &str, password: &str) -> Result<(), CredentialError> {
    validate_sign_in(email, password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}
