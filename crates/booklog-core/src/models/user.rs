use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BooklogError, Result};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;

/// Account role. Each user holds exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Author,
    #[default]
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Author => "Author",
            Self::Reader => "Reader",
        }
    }

    /// Roles a visitor may pick for themselves when registering.
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, Self::Author | Self::Reader)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "author" => Ok(Self::Author),
            "reader" => Ok(Self::Reader),
            _ => Err(format!("Invalid Role: {s}")),
        }
    }
}

/// A registered account, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Trims the username and checks its length and character set
/// (ASCII letters, digits and `._@+-`).
pub fn normalize_username(username: &str) -> Result<String> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(BooklogError::ValidationError(format!(
            "username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._@+-".contains(c))
    {
        return Err(BooklogError::ValidationError(
            "username may only contain letters, digits and . _ @ + -".into(),
        ));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Author ".parse::<Role>().unwrap(), Role::Author);
        assert_eq!("READER".parse::<Role>().unwrap(), Role::Reader);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  reader1 ").unwrap(), "reader1");
        assert_eq!(normalize_username("a.b+c@d-e_f").unwrap(), "a.b+c@d-e_f");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username(&"x".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_self_assignable_roles() {
        assert!(Role::Reader.is_self_assignable());
        assert!(Role::Author.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }
}
