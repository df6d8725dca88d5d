//! URL validation and domain extraction.
//!
//! A URL is valid when it parses as an absolute URL with a non-empty host.
//! Relative hrefs (`/about`, `#top`) and host-less schemes (`mailto:`,
//! `javascript:`) are never valid.

use url::Url;

/// Error type for URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse `input` into an absolute URL that carries a host.
///
/// Surrounding whitespace is ignored. The url crate already lowercases
/// hosts of special schemes.
pub fn parse(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(UrlError::MissingHost(trimmed.to_string())),
    }
}

/// Lowercased host of `input`, or None when it is not a valid URL.
pub fn get_domain(input: &str) -> Option<String> {
    parse(input)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
}

/// Classifies URLs relative to the site's home URL.
#[derive(Debug, Clone)]
pub struct DomainResolver {
    site_domain: Option<String>,
}

impl DomainResolver {
    pub fn new(home_url: &str) -> Self {
        let site_domain = get_domain(home_url);
        if site_domain.is_none() {
            tracing::warn!(home_url, "home URL has no host; no link counts as external");
        }
        Self { site_domain }
    }

    pub fn site_domain(&self) -> Option<&str> {
        self.site_domain.as_deref()
    }

    pub fn is_valid_url(&self, url: &str) -> bool {
        parse(url).is_ok()
    }

    pub fn get_domain(&self, url: &str) -> Option<String> {
        get_domain(url)
    }

    /// True only when both `url` and the home URL have a host and they differ.
    pub fn is_external_url(&self, url: &str) -> bool {
        match (get_domain(url), self.site_domain.as_deref()) {
            (Some(domain), Some(site)) => !site.eq_ignore_ascii_case(&domain),
            _ => false,
        }
    }
}
