/// Login form validators
///
/// Runs before anything is sent to the server:
/// 1. Required fields are present
/// 2. Length limits keep oversized input off the wire
/// 3. An identifier that looks like an email must be a well-formed one

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates the "email or username" field of the login form.
/// Returns the trimmed identifier.
pub fn is_valid_identifier(identifier: &str) -> Result<String, ValidationError> {
    let trimmed = identifier.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email or username".to_string()));
    }

    if trimmed.contains('@') {
        return is_valid_email(trimmed);
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates an email address
fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if email.matches('@').count() != 1 || !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(email.to_string())
}

/// Validates the password field. Passwords are sent untrimmed.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }

    Ok(())
}
