//! Icon-provider requests.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use super::HttpClient;
use prefixer_core::{AppConfig, Error};

/// Requests favicon bytes for a domain from the configured provider.
#[derive(Clone)]
pub struct FaviconFetcher {
    http: Arc<dyn HttpClient>,
    provider_url: Url,
    icon_size: u32,
}

impl FaviconFetcher {
    pub fn new(http: Arc<dyn HttpClient>, provider_url: Url, icon_size: u32) -> Self {
        Self { http, provider_url, icon_size }
    }

    pub fn from_config(http: Arc<dyn HttpClient>, config: &AppConfig) -> Result<Self, Error> {
        let provider_url = Url::parse(&config.provider_url)
            .map_err(|e| Error::InvalidUrl(format!("provider_url: {e}")))?;
        Ok(Self::new(http, provider_url, config.icon_size))
    }

    /// Provider URL for `domain`, keeping any query the provider URL already has.
    pub fn request_url(&self, domain: &str) -> Url {
        let mut url = self.provider_url.clone();
        url.query_pairs_mut()
            .append_pair("domain", domain)
            .append_pair("sz", &self.icon_size.to_string());
        url
    }

    /// Fetch the icon for `domain`. Any 2xx body is accepted as-is.
    pub async fn fetch(&self, domain: &str) -> Result<Bytes, Error> {
        let start = Instant::now();
        let url = self.request_url(domain);

        match self.http.get(&url).await {
            Ok(bytes) => {
                tracing::debug!(domain, bytes = bytes.len(), elapsed_ms = start.elapsed().as_millis() as u64, "fetched favicon");
                Ok(bytes)
            }
            Err(e) => {
                tracing::debug!(domain, error = %e, "favicon fetch failed");
                Err(e)
            }
        }
    }
}
