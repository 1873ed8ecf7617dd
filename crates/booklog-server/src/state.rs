use std::sync::Arc;

use booklog_core::{AppConfig, CoverStore, Database};

use crate::auth::JwtKeys;
use crate::error::ApiResult;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub jwt: Arc<JwtKeys>,
    pub covers: CoverStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtKeys, covers: CoverStore, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            jwt: Arc::new(jwt),
            covers,
            config: Arc::new(config),
        }
    }

    /// Runs a storage call on the blocking pool. Database access and bcrypt
    /// both block.
    pub async fn with_db<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> booklog_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || f(&db)).await?;
        Ok(result?)
    }
}
