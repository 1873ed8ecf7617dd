use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use booklog_core::Role;
use serde::Deserialize;

use super::dto::{AuthResponse, UserDto};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_register_role")]
    pub role: String,
}

fn default_register_role() -> String {
    Role::Reader.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;

    let role = req
        .role
        .trim()
        .parse::<Role>()
        .ok()
        .filter(Role::is_self_assignable)
        .ok_or_else(|| ApiError::BadRequest("Role must be Reader or Author.".into()))?;

    let user = state
        .with_db(move |db| db.register(&req.username, &req.password, role))
        .await?;

    let access_token = state.jwt.issue(&user)?;
    Ok(Json(AuthResponse {
        access_token,
        user: UserDto::from(&user),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;

    let user = state
        .with_db(move |db| db.authenticate(&req.username, &req.password))
        .await?;
    tracing::info!(user_id = user.id, "login");

    let access_token = state.jwt.issue(&user)?;
    Ok(Json(AuthResponse {
        access_token,
        user: UserDto::from(&user),
    }))
}

pub async fn me(user: AuthUser) -> Json<UserDto> {
    Json(UserDto {
        id: user.id(),
        username: user.username,
        role: user.actor.role.to_string(),
    })
}
