use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BooklogError, Result};

/// Root application configuration, loaded from `~/.config/booklog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Holds `booklog.db` and the `uploads/` directory.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Name of the environment variable holding the JWT signing secret.
    pub jwt_secret_env: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Insert the demo users, books and comments at startup.
    pub demo_data: bool,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("booklog");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5080,
            cors_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: "BOOKLOG_JWT_SECRET".to_string(),
            issuer: "booklog".to_string(),
            audience: "booklog-client".to_string(),
            token_ttl_minutes: 120,
            bcrypt_cost: 10,
        }
    }
}

impl AuthConfig {
    /// The signing secret from the configured environment variable, if set
    /// and non-empty.
    pub fn jwt_secret(&self) -> Option<String> {
        std::env::var(&self.jwt_secret_env)
            .ok()
            .filter(|s| !s.trim().is_empty())
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/booklog/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("BOOKLOG_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("booklog")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't
    /// exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// `BOOKLOG_DATA_DIR` and `BOOKLOG_PORT` win over the file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var("BOOKLOG_DATA_DIR").ok().as_deref(),
            std::env::var("BOOKLOG_PORT").ok().as_deref(),
        )
    }

    fn apply_overrides(&mut self, data_dir: Option<&str>, port: Option<&str>) -> Result<()> {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.core.data_dir = dir.to_string();
        }
        if let Some(port) = port.filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| BooklogError::ConfigError(format!("invalid BOOKLOG_PORT: {port}")))?;
        }
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir).join("booklog.db")
    }

    /// Directory uploaded covers are written to and served from.
    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir).join("uploads")
    }

    /// `host:port` the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
