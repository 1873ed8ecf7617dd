use serde::{Deserialize, Serialize};

use super::book::Book;

/// Reading-list state. Any state may be overwritten by any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MyBookStatus {
    #[default]
    WantToRead,
    Reading,
    Finished,
}

impl MyBookStatus {
    /// Lenient parse: anything unrecognised (or absent) becomes `WantToRead`.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl std::fmt::Display for MyBookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WantToRead => write!(f, "WantToRead"),
            Self::Reading => write!(f, "Reading"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

impl std::str::FromStr for MyBookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wanttoread" => Ok(Self::WantToRead),
            "reading" => Ok(Self::Reading),
            "finished" => Ok(Self::Finished),
            _ => Err(format!("Invalid MyBookStatus: {s}")),
        }
    }
}

/// One row of a user's reading list, with the book it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyBook {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub status: MyBookStatus,
    pub book: Book,
}
