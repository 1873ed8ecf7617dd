use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BooklogError, Result};

pub const MAX_COMMENT_LEN: usize = 2000;

/// A comment on a book, joined with its author's username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Trims comment text and rejects blank or oversized content.
pub fn normalize_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(BooklogError::ValidationError("content is required".into()));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(BooklogError::ValidationError(format!(
            "content must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(content.to_string())
}
