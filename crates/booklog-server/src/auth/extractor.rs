use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use booklog_core::{Actor, Role};

use crate::error::ApiError;
use crate::state::AppState;

/// The signed-in caller, taken from a `Bearer` access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub actor: Actor,
    pub username: String,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.actor.user_id
    }

    pub fn role(&self) -> Role {
        self.actor.role
    }

    pub fn is_admin(&self) -> bool {
        self.actor.is_admin()
    }

    fn from_token(token: &str, state: &AppState) -> Result<Self, ApiError> {
        let claims = state.jwt.verify(token)?;
        let actor = claims
            .actor()
            .ok_or_else(|| ApiError::Unauthorized("Malformed token claims".into()))?;
        Ok(Self {
            actor,
            username: claims.name,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::Unauthorized("Missing bearer token".into()))?;

        Self::from_token(bearer.token(), state)
    }
}

/// The caller if a valid token was sent. A missing or unusable token means
/// an anonymous visitor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref().map(|u| &u.actor)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Ok(TypedHeader(Authorization(bearer))) =
            parts.extract::<TypedHeader<Authorization<Bearer>>>().await
        else {
            return Ok(Self(None));
        };

        match AuthUser::from_token(bearer.token(), state) {
            Ok(user) => Ok(Self(Some(user))),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unusable token on public route");
                Ok(Self(None))
            }
        }
    }
}
