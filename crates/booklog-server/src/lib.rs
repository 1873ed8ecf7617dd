//! BookLog HTTP server: axum routes over the core storage facade.

pub mod api;
pub mod auth;
pub mod error;
pub mod state;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::Router;
use booklog_core::{seed_demo_data, AppConfig, CoverStore, Database};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use auth::JwtKeys;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Multipart framing on top of the file itself.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

/// The complete application: `/api` routes, static `/uploads`, CORS and
/// request tracing.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes + UPLOAD_OVERHEAD_BYTES;
    let uploads = ServeDir::new(state.covers.dir());
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .nest("/api", api::routes())
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens storage, optionally seeds demo data, and builds the state the
/// router runs on.
pub fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let db_path = config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?
        .with_password_cost(config.auth.bcrypt_cost);

    let uploads_dir = config.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)
        .with_context(|| format!("creating {}", uploads_dir.display()))?;
    let covers = CoverStore::new(uploads_dir).with_max_bytes(config.server.max_upload_bytes);

    if config.seed.demo_data {
        let report = seed_demo_data(&db, Some(&covers)).context("seeding demo data")?;
        tracing::info!(?report, "demo seed finished");
    }

    let jwt = JwtKeys::from_config(&config.auth);
    Ok(AppState::new(db, jwt, covers, config))
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = tokio::task::spawn_blocking(move || build_state(config)).await??;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "booklog listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("booklog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
