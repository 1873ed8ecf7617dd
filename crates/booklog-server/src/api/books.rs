use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use booklog_core::{BookDraft, BookFilter, VisibilityStatus};
use serde::Deserialize;
use serde_json::Value;

use super::dto::{to_dtos, BookDto};
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
    /// Only the caller's own books. Ignored for anonymous callers.
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    /// Any unrecognised value means Published.
    pub status: Option<Value>,
}

impl BookRequest {
    fn into_draft(self) -> BookDraft {
        BookDraft {
            title: self.title,
            author_name: self.author_name,
            genre: self.genre,
            description: self.description,
            cover_image_url: self.cover_image_url,
            status: VisibilityStatus::parse_or_default(self.status.as_ref().and_then(Value::as_str)),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    query: Result<Query<BookListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<BookDto>>> {
    let Query(query) = query?;
    let viewer = user.actor().copied();

    let mut filter = BookFilter::default();
    if let Some(q) = query.q.filter(|q| !q.trim().is_empty()) {
        filter = filter.with_query(q.trim());
    }
    if let Some(genre) = query.genre.filter(|g| !g.trim().is_empty()) {
        filter = filter.with_genre(genre.trim());
    }
    if query.mine
        && let Some(actor) = viewer
    {
        filter = filter.with_owner(actor.user_id);
    }

    let books = state
        .with_db(move |db| db.list_books(viewer.as_ref(), &filter))
        .await?;
    Ok(Json(to_dtos(books)))
}

pub async fn genres(
    State(state): State<AppState>,
    user: MaybeAuthUser,
) -> ApiResult<Json<Vec<String>>> {
    let viewer = user.actor().copied();
    let genres = state.with_db(move |db| db.genres(viewer.as_ref())).await?;
    Ok(Json(genres))
}

pub async fn get(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<BookDto>> {
    let Path(id) = id?;
    let viewer = user.actor().copied();
    let book = state.with_db(move |db| db.get_book(viewer.as_ref(), id)).await?;
    Ok(Json(book.into()))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BookDto>)> {
    let Json(req) = payload?;
    let actor = user.actor;
    let book = state
        .with_db(move |db| db.create_book(&actor, req.into_draft()))
        .await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> ApiResult<Json<BookDto>> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let actor = user.actor;
    let book = state
        .with_db(move |db| db.update_book(&actor, id, req.into_draft()))
        .await?;
    Ok(Json(book.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    let actor = user.actor;
    state.with_db(move |db| db.delete_book(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
