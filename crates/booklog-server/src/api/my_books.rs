use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use booklog_core::MyBookStatus;
use serde::Deserialize;
use serde_json::Value;

use super::dto::{to_dtos, MyBookDto};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SetStatusRequest {
    /// Any unrecognised value means WantToRead.
    pub status: Option<Value>,
}

impl SetStatusRequest {
    fn status(&self) -> MyBookStatus {
        MyBookStatus::parse_or_default(self.status.as_ref().and_then(Value::as_str))
    }
}

/// The caller's reading list, most recently added first.
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<MyBookDto>>> {
    let actor = user.actor;
    let entries = state.with_db(move |db| db.list_my_books(&actor)).await?;
    Ok(Json(to_dtos(entries)))
}

/// Adds the book to the caller's list or changes its status. A missing or
/// malformed body counts as WantToRead.
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    book_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SetStatusRequest>, JsonRejection>,
) -> ApiResult<Json<MyBookDto>> {
    let Path(book_id) = book_id?;
    let status = payload.map(|Json(req)| req.status()).unwrap_or_default();
    let actor = user.actor;

    let entry = state
        .with_db(move |db| db.set_my_book_status(&actor, book_id, status))
        .await?;
    Ok(Json(entry.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    book_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(book_id) = book_id?;
    let actor = user.actor;
    state.with_db(move |db| db.remove_my_book(&actor, book_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
