use crate::api::schema::Credentials;
use crate::error::{AppError, Result};

pub const MIN_PASSWORD_LEN: usize = 5;

pub fn login_credentials(username: &str, password: &str) -> Result<Credentials> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation("All fields are required.".to_string()));
    }
    Ok(Credentials {
        username: username.to_string(),
        password_hash: password.to_string(),
    })
}

/// Check a new account's credentials before they are sent to the backend.
pub fn registration_credentials(username: &str, password: &str, confirm: &str) -> Result<Credentials> {
    let credentials = login_credentials(username, password)?;
    let password = credentials.password_hash.as_str();

    if password != confirm.trim() {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be more than 4 characters.".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Password must contain at least one number (0-9).".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one uppercase letter (A-Z).".to_string(),
        ));
    }

    Ok(credentials)
}
