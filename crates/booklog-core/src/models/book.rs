use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BooklogError, Result};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_AUTHOR_NAME_LEN: usize = 200;
pub const MAX_GENRE_LEN: usize = 80;

// ─── Visibility ────────────────────────────────────────────

/// Whether a book shows up for everyone or only for its owner and admins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityStatus {
    #[default]
    Published,
    Hidden,
}

impl VisibilityStatus {
    /// Lenient parse: anything unrecognised (or absent) becomes `Published`.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl std::fmt::Display for VisibilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Published => write!(f, "Published"),
            Self::Hidden => write!(f, "Hidden"),
        }
    }
}

impl std::str::FromStr for VisibilityStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" => Ok(Self::Published),
            "hidden" => Ok(Self::Hidden),
            _ => Err(format!("Invalid VisibilityStatus: {s}")),
        }
    }
}

// ─── Book ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,

    pub status: VisibilityStatus,

    /// Owner. Never rewritten after insert.
    pub created_by_user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of a book, used for both create and full update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author_name: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: VisibilityStatus,
}

impl BookDraft {
    pub fn new(title: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author_name: author_name.into(),
            ..Default::default()
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_image_url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status: VisibilityStatus) -> Self {
        self.status = status;
        self
    }

    /// Trims text fields, turns blank optionals into `None` and enforces the
    /// length limits.
    pub fn normalized(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let author_name = self.author_name.trim().to_string();

        if title.is_empty() {
            return Err(BooklogError::ValidationError("title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(BooklogError::ValidationError(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if author_name.is_empty() {
            return Err(BooklogError::ValidationError("authorName is required".into()));
        }
        if author_name.chars().count() > MAX_AUTHOR_NAME_LEN {
            return Err(BooklogError::ValidationError(format!(
                "authorName must be at most {MAX_AUTHOR_NAME_LEN} characters"
            )));
        }

        let genre = non_blank(self.genre);
        if genre.as_ref().is_some_and(|g| g.chars().count() > MAX_GENRE_LEN) {
            return Err(BooklogError::ValidationError(format!(
                "genre must be at most {MAX_GENRE_LEN} characters"
            )));
        }

        Ok(Self {
            title,
            author_name,
            genre,
            description: non_blank(self.description),
            cover_image_url: non_blank(self.cover_image_url),
            status: self.status,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ─── Filter ────────────────────────────────────────────────

/// Narrowing applied to book listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    /// Case-insensitive substring of title or author name.
    pub query: Option<String>,
    /// Exact genre, compared case-insensitively.
    pub genre: Option<String>,
    pub owner_id: Option<i64>,
}

impl BookFilter {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}
