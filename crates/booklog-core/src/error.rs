use thiserror::Error;

/// All errors that can occur in booklog-core.
#[derive(Debug, Error)]
pub enum BooklogError {
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Book {0} is not in the reading list")]
    ReadingListEntryNotFound(i64),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Username already taken: {0}")]
    DuplicateUser(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BooklogError {
    /// Whether the error means the addressed resource does not exist
    /// (or is not visible to the caller).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BookNotFound(_)
                | Self::CommentNotFound(_)
                | Self::UserNotFound(_)
                | Self::ReadingListEntryNotFound(_)
        )
    }
}

/// Maps a UNIQUE constraint violation to [`BooklogError::Conflict`], leaving
/// every other database error untouched.
pub(crate) fn conflict_on_unique(err: rusqlite::Error, what: impl Into<String>) -> BooklogError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            BooklogError::Conflict(what.into())
        }
        _ => BooklogError::Database(err),
    }
}

pub type Result<T> = std::result::Result<T, BooklogError>;
