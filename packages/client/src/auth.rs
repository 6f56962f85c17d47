//! Login and registration form validation.
//!
//! Validation runs before anything is sent; a rejected form never reaches
//! the gateway.

use thiserror::Error;

/// Minimum username length accepted by the registration form
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length accepted by the registration form
pub const MIN_PASSWORD_LEN: usize = 6;

/// Which of the two mutually exclusive auth forms is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Inline form errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter username and password")]
    MissingFields,

    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

/// Validated form contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Validate the login form. Only presence is checked.
///
/// The username is trimmed; the password is taken as typed.
pub fn validate_login(username: &str, password: &str) -> Result<Credentials, ValidationError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Validate the registration form.
///
/// Checks presence first, then the username length, then the password
/// length, reporting only the first failure.
pub fn validate_registration(
    username: &str,
    password: &str,
) -> Result<Credentials, ValidationError> {
    let credentials = validate_login(username, password)?;
    if credentials.username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(credentials)
}
