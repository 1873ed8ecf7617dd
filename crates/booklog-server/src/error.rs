use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use booklog_core::BooklogError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] BooklogError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("token error: {0}")]
    Token(#[source] jsonwebtoken::errors::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Core(e) => match e {
                e if e.is_not_found() => (StatusCode::NOT_FOUND, "not_found"),
                BooklogError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
                BooklogError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "unauthorized"),
                BooklogError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation"),
                BooklogError::InvalidUpload(_) => (StatusCode::BAD_REQUEST, "invalid_upload"),
                BooklogError::DuplicateUser(_) | BooklogError::Conflict(_) => {
                    (StatusCode::CONFLICT, "conflict")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Task(_) | Self::Token(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            status: "error",
            error: kind,
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}
