use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{BooklogError, Result};

pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Public URL prefix the uploads directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Cover images written to a single flat directory under random names.
#[derive(Debug, Clone)]
pub struct CoverStore {
    dir: PathBuf,
    max_bytes: Option<usize>,
}

impl CoverStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_bytes: None,
        }
    }

    /// Rejects uploads larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a `/uploads/<name>` URL points at a file in this store.
    pub fn contains(&self, url: &str) -> bool {
        let Some(name) = url
            .strip_prefix(UPLOADS_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return false;
        };
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return false;
        }
        self.dir.join(name).is_file()
    }

    /// Validates and stores an uploaded cover, returning its relative URL
    /// (`/uploads/<name>`).
    pub fn save(&self, original_name: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
        if let Some(max) = self.max_bytes
            && bytes.len() > max
        {
            return Err(BooklogError::InvalidUpload(format!(
                "File too large (max {max} bytes)."
            )));
        }
        let ext = validate_cover(original_name, content_type, bytes)?;

        std::fs::create_dir_all(&self.dir)?;
        let file_name = format!("{}{ext}", Uuid::new_v4().simple());
        std::fs::write(self.dir.join(&file_name), bytes)?;

        tracing::info!(file = %file_name, size = bytes.len(), "stored cover image");
        Ok(format!("{UPLOADS_URL_PREFIX}/{file_name}"))
    }
}

/// Checks an upload against the allowed image types and returns its
/// lowercased extension (with the leading dot).
pub fn validate_cover(original_name: &str, content_type: &str, bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(BooklogError::InvalidUpload("No file uploaded.".into()));
    }

    let content_type = content_type.trim().to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(BooklogError::InvalidUpload("Only jpg, png, webp allowed.".into()));
    }

    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(BooklogError::InvalidUpload("Invalid file extension.".into()));
    }

    Ok(ext)
}
