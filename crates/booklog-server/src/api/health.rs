use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Status {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<Status> {
    Json(Status {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
