//! Content rewriting: decorate outbound links with their site's favicon.
//!
//! ### Pipeline
//! 1. Fragment cache lookup by content hash (hit returns verbatim).
//! 2. Parse; any parser error returns the input untouched and uncached.
//! 3. Plan: pick candidate anchors and apply the eligibility rules.
//! 4. Resolve: one favicon lookup per distinct href, strictly sequential.
//! 5. Apply: re-parse, mutate the tree, serialize once.
//!
//! When no link ends up decorated the input is returned byte for byte, so
//! rewriting is idempotent and never reformats untouched markup.

pub mod dom;
pub mod links;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::service::FaviconService;
use prefixer_core::cache::hash::{CACHE_GROUP, content_key};
use prefixer_core::{ConfigStore, Error, ObjectCache, Settings};

pub use dom::{ICON_CLASS, WRAPPER_CLASS};

/// Lifetime of a cached rewritten fragment.
pub const FRAGMENT_TTL: Duration = Duration::from_secs(60 * 60);

/// Rewrites HTML fragments, caching whole results.
#[derive(Clone)]
pub struct ContentRewriter {
    service: Arc<FaviconService>,
    options: Arc<dyn ConfigStore>,
    object_cache: Arc<dyn ObjectCache>,
}

impl ContentRewriter {
    pub fn new(service: Arc<FaviconService>, options: Arc<dyn ConfigStore>, object_cache: Arc<dyn ObjectCache>) -> Self {
        Self { service, options, object_cache }
    }

    /// Rewrite `content`, returning it unchanged whenever nothing qualifies
    /// or the markup cannot be parsed cleanly.
    pub async fn process_content(&self, content: &str) -> String {
        let key = content_key(content);
        if let Some(cached) = self.object_cache.get(CACHE_GROUP, &key).await {
            tracing::debug!("fragment cache hit");
            return cached;
        }

        let settings = match Settings::load(self.options.as_ref()).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(error = %e, "falling back to default settings");
                Settings::default()
            }
        };

        let plan = match self.plan(content, settings.ignore_internal) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::debug!(error = %e, "leaving fragment unmodified");
                return content.to_string();
            }
        };

        let icons = self.resolve(&plan).await;

        let output = if icons.iter().any(Option::is_some) {
            match dom::decorate(content, &icons) {
                Ok(html) => html,
                Err(e) => {
                    tracing::debug!(error = %e, "leaving fragment unmodified");
                    return content.to_string();
                }
            }
        } else {
            content.to_string()
        };

        self.object_cache
            .set(CACHE_GROUP, &key, output.clone(), FRAGMENT_TTL)
            .await;
        output
    }

    fn plan(&self, content: &str, ignore_internal: bool) -> Result<Vec<Option<String>>, Error> {
        let html = dom::parse_fragment(content)?;
        Ok(links::plan_links(&html, ignore_internal, self.service.resolver()))
    }

    /// Icon URL for every planned link, looking each distinct href up once.
    async fn resolve(&self, plan: &[Option<String>]) -> Vec<Option<String>> {
        let mut resolved: HashMap<&str, Option<String>> = HashMap::new();
        let mut icons = Vec::with_capacity(plan.len());

        for href in plan {
            let Some(href) = href.as_deref() else {
                icons.push(None);
                continue;
            };

            let icon = match resolved.get(href) {
                Some(icon) => icon.clone(),
                None => {
                    let icon = self.icon_url(href).await;
                    resolved.insert(href, icon.clone());
                    icon
                }
            };
            icons.push(icon);
        }

        icons
    }

    async fn icon_url(&self, href: &str) -> Option<String> {
        let path = self.service.get_favicon(href).await?;
        let url = self.service.store().public_url(&path);
        if url.is_none() {
            tracing::debug!(path = %path.display(), "favicon lies outside the upload directory");
        }
        url
    }
}
