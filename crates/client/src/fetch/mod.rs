//! HTTP access for favicon retrieval.
//!
//! ### Single Attempt
//! - One GET per call; no retry, no backoff.
//! - Transport errors, non-2xx statuses and oversized bodies are all
//!   `FetchFailed`.
//!
//! ### Limits
//! - Timeout and redirect limit come from [`FetchConfig`].
//! - Max body bytes: 1MB (configurable).

pub mod favicon;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

pub use favicon::FaviconFetcher;

use prefixer_core::{AppConfig, Error};

/// Minimal GET capability the fetcher depends on.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch `url`, returning the body of a 2xx response.
    async fn get(&self, url: &Url) -> Result<Bytes, Error>;
}

/// Configuration for the reqwest-backed client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "favicon-prefixer/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 1MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "favicon-prefixer/0.1".to_string(),
            max_bytes: 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Production [`HttpClient`] on top of reqwest.
pub struct ReqwestClient {
    http: Client,
    config: FetchConfig,
}

impl ReqwestClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<Bytes, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header("Accept", "image/png,image/*;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchFailed(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::FetchFailed(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchFailed(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} in {}ms ({} bytes)",
            url,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }
}
