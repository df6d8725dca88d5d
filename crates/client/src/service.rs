//! Favicon lookup facade.
//!
//! Composes the resolver, the store and the fetcher. Nothing here returns an
//! error: a favicon that cannot be produced is simply absent.

use std::path::PathBuf;
use std::time::Instant;

use crate::domain::DomainResolver;
use crate::fetch::FaviconFetcher;
use crate::store::FaviconStore;

/// Resolves a link URL to a locally stored favicon.
#[derive(Clone)]
pub struct FaviconService {
    resolver: DomainResolver,
    store: FaviconStore,
    fetcher: FaviconFetcher,
}

impl FaviconService {
    pub fn new(resolver: DomainResolver, store: FaviconStore, fetcher: FaviconFetcher) -> Self {
        Self { resolver, store, fetcher }
    }

    pub fn store(&self) -> &FaviconStore {
        &self.store
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    /// Favicon path for the domain of `url`, fetching it on a cache miss.
    pub async fn get_favicon(&self, url: &str) -> Option<PathBuf> {
        if !self.resolver.is_valid_url(url) {
            tracing::debug!(url, "invalid URL");
            return None;
        }

        let Some(domain) = self.resolver.get_domain(url) else {
            tracing::debug!(url, "couldn't extract domain");
            return None;
        };

        match self.store.get_cached_favicon(&domain).await {
            Ok(Some(path)) => {
                tracing::debug!(domain, "using cached favicon");
                return Some(path);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(domain, error = %e, "favicon index lookup failed"),
        }

        self.fetch_and_cache(&domain).await
    }

    async fn fetch_and_cache(&self, domain: &str) -> Option<PathBuf> {
        let start = Instant::now();
        tracing::debug!(domain, "fetching new favicon");

        let bytes = self.fetcher.fetch(domain).await.ok()?;

        match self.store.save_favicon(domain, bytes).await {
            Ok(path) => {
                tracing::debug!(
                    domain,
                    path = %path.display(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "saved favicon"
                );
                Some(path)
            }
            Err(e) => {
                tracing::debug!(domain, error = %e, "failed to save favicon");
                None
            }
        }
    }

    pub fn is_external_url(&self, url: &str) -> bool {
        self.resolver.is_external_url(url)
    }

    pub fn is_valid_url(&self, url: &str) -> bool {
        self.resolver.is_valid_url(url)
    }

    pub fn get_domain(&self, url: &str) -> Option<String> {
        self.resolver.get_domain(url)
    }
}
