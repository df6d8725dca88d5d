//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn require_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be an http(s) URL".into() });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must have a host".into() });
    }

    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `home_url`, `upload_url` or `provider_url` is not an absolute http(s) URL
    /// - `icon_size` is 0 or larger than 256
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_http_url("home_url", &self.home_url)?;
        require_http_url("upload_url", &self.upload_url)?;
        require_http_url("provider_url", &self.provider_url)?;

        if self.icon_size == 0 || self.icon_size > 256 {
            return Err(ConfigError::Invalid { field: "icon_size".into(), reason: "must be between 1 and 256".into() });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.allow_admin_tools {
            tracing::warn!("allow_admin_tools is set; MCP clients can clear the favicon cache");
        }

        Ok(())
    }
}
