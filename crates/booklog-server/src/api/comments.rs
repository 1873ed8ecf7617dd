use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::dto::{to_dtos, CommentDto};
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Comments of a book, newest first.
pub async fn list_for_book(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    book_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<CommentDto>>> {
    let Path(book_id) = book_id?;
    let viewer = user.actor().copied();
    let comments = state
        .with_db(move |db| db.list_comments(viewer.as_ref(), book_id))
        .await?;
    Ok(Json(to_dtos(comments)))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    book_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentDto>)> {
    let Path(book_id) = book_id?;
    let Json(req) = payload?;
    let actor = user.actor;
    let comment = state
        .with_db(move |db| db.add_comment(&actor, book_id, &req.content))
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Json<CommentDto>> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let actor = user.actor;
    let comment = state
        .with_db(move |db| db.update_comment(&actor, id, &req.content))
        .await?;
    Ok(Json(comment.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    let actor = user.actor;
    state.with_db(move |db| db.delete_comment(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
