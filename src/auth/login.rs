/// Login form handling
///
/// Local validation of the form, and the result handed back to the page
/// after a successful login.

use crate::auth::backend::{LoginRequest, LoginUser};
use crate::error::ValidationError;
use crate::validators::{is_valid_identifier, is_valid_password};

/// Role whose users land on the admin area after login
pub const ADMIN_ROLE: &str = "admin";

/// Shown when the server rejects a login without saying why
pub const DEFAULT_LOGIN_ERROR: &str = "Invalid email/username or password";

/// What the user typed into the login form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email_or_username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email_or_username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email_or_username: email_or_username.into(),
            password: password.into(),
        }
    }

    /// Check every field and collect all problems, in form order.
    pub fn field_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Err(e) = is_valid_identifier(&self.email_or_username) {
            errors.push(e);
        }
        if let Err(e) = is_valid_password(&self.password) {
            errors.push(e);
        }
        errors
    }

    /// Build the request body, failing on the first invalid field.
    pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
        let username_or_email = is_valid_identifier(&self.email_or_username)?;
        is_valid_password(&self.password)?;

        Ok(LoginRequest {
            username_or_email,
            password: self.password.clone(),
        })
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub role: Option<String>,
    pub user: Option<LoginUser>,
    /// Where the page should go next
    pub destination: String,
}

impl LoginOutcome {
    pub(crate) fn new(user: Option<LoginUser>, home: &str, admin: &str) -> Self {
        let role = user.as_ref().and_then(|u| u.role.clone());
        let destination = if role.as_deref() == Some(ADMIN_ROLE) {
            admin.to_string()
        } else {
            home.to_string()
        };

        Self {
            role,
            user,
            destination,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}
