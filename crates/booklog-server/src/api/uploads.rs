use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the image.
pub const COVER_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Stores a cover image for later use as a book's `coverImageUrl`.
pub async fn upload_cover(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    if !user.actor.can_create_books() {
        return Err(ApiError::Forbidden("Only admins and authors can upload covers".into()));
    }

    let mut multipart =
        multipart.map_err(|_| ApiError::BadRequest("No file uploaded.".into()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(COVER_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let Some((file_name, content_type, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded.".into()));
    };

    let covers = state.covers.clone();
    let url = tokio::task::spawn_blocking(move || covers.save(&file_name, &content_type, &bytes))
        .await??;

    tracing::info!(user_id = user.id(), url = %url, "cover uploaded");
    Ok(Json(UploadResponse { url }))
}
