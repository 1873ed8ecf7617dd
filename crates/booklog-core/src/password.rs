//! Password policy and bcrypt hashing.

use crate::error::{BooklogError, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`] or missing a
/// lowercase letter, an uppercase letter, a digit or a symbol.
pub fn validate_password(password: &str) -> Result<()> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!("at least {MIN_PASSWORD_LEN} characters"));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        problems.push("a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        problems.push("an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("a digit".to_string());
    }
    if password.chars().all(|c| c.is_alphanumeric()) {
        problems.push("a non-alphanumeric character".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(BooklogError::ValidationError(format!(
            "password must contain {}",
            problems.join(", ")
        )))
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
