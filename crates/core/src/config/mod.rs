//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FAVICON_PREFIXER_*)
//! 2. TOML config file (explicit path, or FAVICON_PREFIXER_CONFIG_FILE)
//! 3. Built-in defaults
//!
//! These are process-level settings. The editorial toggles (enabled post
//! types, internal links, debug logging) live in the options table, see
//! [`crate::settings`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Directory name under `upload_dir` holding one icon per domain.
pub const FAVICON_DIR_NAME: &str = "favicons";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding the favicon index and options.
    ///
    /// Set via FAVICON_PREFIXER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Local directory that publicly served uploads live in.
    ///
    /// Favicons are stored under `{upload_dir}/favicons`.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Public base URL `upload_dir` is served from.
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Home URL of the site whose content is rewritten.
    ///
    /// Links to this host are internal.
    #[serde(default = "default_home_url")]
    pub home_url: String,

    /// Favicon-by-domain endpoint queried with `domain` and `sz`.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Requested icon edge length in pixels.
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum icon body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether the MCP server may run administrative tools (cache clear).
    ///
    /// Set via FAVICON_PREFIXER_ALLOW_ADMIN_TOOLS environment variable.
    #[serde(default)]
    pub allow_admin_tools: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./favicon-prefixer.sqlite")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_upload_url() -> String {
    "http://localhost/uploads".into()
}

fn default_home_url() -> String {
    "http://localhost".into()
}

fn default_provider_url() -> String {
    "https://www.google.com/s2/favicons".into()
}

fn default_icon_size() -> u32 {
    16
}

fn default_user_agent() -> String {
    "favicon-prefixer/0.1".into()
}

fn default_max_bytes() -> usize {
    1_048_576 // 1MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            upload_dir: default_upload_dir(),
            upload_url: default_upload_url(),
            home_url: default_home_url(),
            provider_url: default_provider_url(),
            icon_size: default_icon_size(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            allow_admin_tools: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Directory holding the cached favicon files.
    pub fn favicon_dir(&self) -> PathBuf {
        self.upload_dir.join(FAVICON_DIR_NAME)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Uses `FAVICON_PREFIXER_CONFIG_FILE` as the TOML file when set.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var_os("FAVICON_PREFIXER_CONFIG_FILE").map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Load configuration with an explicit TOML file.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FAVICON_PREFIXER_`
    /// 2. TOML file at `config_file` (if given)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("FAVICON_PREFIXER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
