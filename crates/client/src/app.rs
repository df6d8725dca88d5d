//! Process-wide application context.
//!
//! [`FaviconPrefixer`] is built once by each binary and owns every
//! collaborator: the database, the object cache, the favicon store, the
//! service and the rewriter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::DomainResolver;
use crate::fetch::{FaviconFetcher, FetchConfig, HttpClient, ReqwestClient};
use crate::rewrite::{ContentRewriter, ICON_CLASS};
use crate::service::FaviconService;
use crate::store::{CacheStatus, CachedFavicon, FaviconStore};
use prefixer_core::cache::hash::CACHE_GROUP;
use prefixer_core::{AppConfig, Authorizer, CacheDb, Error, MemoryObjectCache, ObjectCache, Settings};

/// Stages of the end-to-end smoke test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutotestStep {
    UrlValidation,
    FaviconRetrieval,
    ContentProcessing,
}

impl std::fmt::Display for AutotestStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutotestStep::UrlValidation => write!(f, "URL validation"),
            AutotestStep::FaviconRetrieval => write!(f, "favicon retrieval"),
            AutotestStep::ContentProcessing => write!(f, "content processing"),
        }
    }
}

/// A failed smoke-test stage.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{step} failed: {reason}")]
pub struct AutotestFailure {
    pub step: AutotestStep,
    pub reason: String,
}

impl AutotestFailure {
    fn new(step: AutotestStep, reason: impl Into<String>) -> Self {
        Self { step, reason: reason.into() }
    }
}

/// What a successful smoke test observed.
#[derive(Debug, Clone)]
pub struct AutotestReport {
    pub favicon_path: PathBuf,
    pub retrieval_time: Duration,
    pub original: String,
    pub processed: String,
}

/// Synthetic fragment the smoke test runs through the rewriter.
pub fn autotest_fragment(url: &str) -> String {
    format!(
        r#"<article><p>Testing external link to <a href="{}">test website</a></p></article>"#,
        html_escape::encode_double_quoted_attribute(url)
    )
}

/// Application context shared by the CLI and the MCP server.
#[derive(Clone)]
pub struct FaviconPrefixer {
    config: Arc<AppConfig>,
    db: CacheDb,
    object_cache: Arc<dyn ObjectCache>,
    service: Arc<FaviconService>,
    rewriter: ContentRewriter,
}

impl FaviconPrefixer {
    /// Open the database, build the production HTTP client and run the
    /// activation step.
    pub async fn open(config: AppConfig) -> Result<Self, Error> {
        let db = CacheDb::open(&config.db_path).await?;
        Self::from_db(config, db).await
    }

    /// Like [`FaviconPrefixer::open`] for a database the caller already opened.
    pub async fn from_db(config: AppConfig, db: CacheDb) -> Result<Self, Error> {
        let http = ReqwestClient::new(FetchConfig::from(&config))?;
        let app = Self::with_parts(config, db, Arc::new(http), Arc::new(MemoryObjectCache::new()))?;
        app.activate().await?;

        tracing::info!(
            db = %app.config.db_path.display(),
            favicons = %app.config.favicon_dir().display(),
            "favicon prefixer ready"
        );
        Ok(app)
    }

    /// Assemble the context from already-built capabilities.
    pub fn with_parts(
        config: AppConfig, db: CacheDb, http: Arc<dyn HttpClient>, object_cache: Arc<dyn ObjectCache>,
    ) -> Result<Self, Error> {
        let resolver = DomainResolver::new(&config.home_url);
        let store = FaviconStore::from_config(db.clone(), &config);
        let fetcher = FaviconFetcher::from_config(http, &config)?;
        let service = Arc::new(FaviconService::new(resolver, store, fetcher));
        let rewriter = ContentRewriter::new(service.clone(), Arc::new(db.clone()), object_cache.clone());

        Ok(Self { config: Arc::new(config), db, object_cache, service, rewriter })
    }

    /// Create the favicon directory and drop index records past their TTL.
    pub async fn activate(&self) -> Result<(), Error> {
        self.store().ensure_favicon_dir().await?;
        let purged = self.db.purge_expired_transients().await?;
        if purged > 0 {
            tracing::debug!(purged, "removed expired favicon records");
        }
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn service(&self) -> &FaviconService {
        &self.service
    }

    pub fn store(&self) -> &FaviconStore {
        self.service.store()
    }

    pub async fn settings(&self) -> Result<Settings, Error> {
        Settings::load(&self.db).await
    }

    /// Persist `settings` and drop cached fragments rendered under the old ones.
    pub async fn save_settings(&self, settings: &Settings) -> Result<(), Error> {
        settings.save(&self.db).await?;
        self.object_cache.flush_group(CACHE_GROUP).await;
        Ok(())
    }

    /// Content filter: rewrite `content` when `post_type` is enabled.
    pub async fn filter_content(&self, content: &str, post_type: &str) -> String {
        let settings = match self.settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(error = %e, "falling back to default settings");
                Settings::default()
            }
        };

        if !settings.is_enabled_post_type(post_type) {
            tracing::debug!(post_type, enabled = ?settings.post_types, "post type not enabled");
            return content.to_string();
        }

        self.rewriter.process_content(content).await
    }

    /// Rewrite `content` regardless of its post type.
    pub async fn process_content(&self, content: &str) -> String {
        self.rewriter.process_content(content).await
    }

    /// Validate `url`, fetch its favicon and run a synthetic fragment
    /// through the rewriter.
    pub async fn autotest(&self, url: &str) -> Result<AutotestReport, AutotestFailure> {
        if !self.service.is_external_url(url) {
            return Err(AutotestFailure::new(AutotestStep::UrlValidation, "URL must be external for testing"));
        }

        let start = Instant::now();
        let favicon_path = self
            .service
            .get_favicon(url)
            .await
            .ok_or_else(|| AutotestFailure::new(AutotestStep::FaviconRetrieval, "no favicon returned"))?;
        let retrieval_time = start.elapsed();

        let original = autotest_fragment(url);
        let processed = self.process_content(&original).await;

        if processed == original {
            return Err(AutotestFailure::new(AutotestStep::ContentProcessing, "content was not modified"));
        }
        if !processed.contains(ICON_CLASS) {
            return Err(AutotestFailure::new(AutotestStep::ContentProcessing, "favicon was not added to content"));
        }

        Ok(AutotestReport { favicon_path, retrieval_time, original, processed })
    }

    /// Clear the favicon cache and every cached fragment pointing into it.
    pub async fn clear_cache(&self, authorizer: &dyn Authorizer) -> Result<(), Error> {
        self.store().clear_cache(authorizer).await?;
        self.object_cache.flush_group(CACHE_GROUP).await;
        Ok(())
    }

    pub async fn cache_status(&self) -> Result<CacheStatus, Error> {
        self.store().get_cache_status().await
    }

    pub async fn cache_list(&self) -> Result<Vec<CachedFavicon>, Error> {
        self.store().get_cached_favicons().await
    }

    /// Remove everything this application ever stored.
    pub async fn uninstall(&self) -> Result<(), Error> {
        let store = self.store();
        store.purge().await?;
        store.delete_favicon_directory_if_empty().await?;
        Settings::delete_all(&self.db).await?;
        self.object_cache.flush_group(CACHE_GROUP).await;

        tracing::info!("favicon prefixer data removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubHttpClient;
    use prefixer_core::StaticAuthorizer;
    use prefixer_core::cache::hash::content_key;
    use prefixer_core::settings::ALL_OPTIONS;
    use tempfile::TempDir;

    const POST: &str = r#"<p>Read <a href="https://example.com/docs">the docs</a>.</p>"#;

    struct Harness {
        dir: TempDir,
        db: CacheDb,
        http: Arc<StubHttpClient>,
        cache: Arc<MemoryObjectCache>,
        app: FaviconPrefixer,
    }

    async fn harness(http: StubHttpClient) -> Harness {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().to_path_buf(),
            upload_url: "https://blog.test/uploads".into(),
            home_url: "https://blog.test".into(),
            provider_url: "https://icons.test/s2/favicons".into(),
            ..Default::default()
        };
        let db = CacheDb::open_in_memory().await.unwrap();
        let http = Arc::new(http);
        let cache = Arc::new(MemoryObjectCache::new());
        let app = FaviconPrefixer::with_parts(config, db.clone(), http.clone(), cache.clone()).unwrap();
        app.activate().await.unwrap();
        Harness { dir, db, http, cache, app }
    }

    #[tokio::test]
    async fn test_activate_creates_favicon_dir() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        assert!(h.dir.path().join("favicons").is_dir());
    }

    #[tokio::test]
    async fn test_activate_drops_expired_records() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        h.db.set_transient("favicon_prefixer_stale", "/gone.png", chrono::Duration::seconds(-10))
            .await
            .unwrap();

        h.app.activate().await.unwrap();
        assert_eq!(h.db.purge_expired_transients().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_filter_content_gates_on_post_type() {
        let h = harness(StubHttpClient::ok(b"png")).await;

        assert_eq!(h.app.filter_content(POST, "page").await, POST);
        assert_eq!(h.http.calls(), 0);

        let out = h.app.filter_content(POST, "post").await;
        assert!(out.contains(ICON_CLASS));
        assert_eq!(h.http.calls(), 1);
    }

    #[tokio::test]
    async fn test_saved_post_types_apply() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        let settings = Settings { post_types: vec!["page".into()], ..Settings::default() };
        h.app.save_settings(&settings).await.unwrap();

        assert_eq!(h.app.filter_content(POST, "post").await, POST);
        assert!(h.app.filter_content(POST, "page").await.contains(ICON_CLASS));
    }

    #[tokio::test]
    async fn test_save_settings_flushes_fragment_cache() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        h.app.process_content(POST).await;
        assert!(h.cache.get(CACHE_GROUP, &content_key(POST)).await.is_some());

        h.app.save_settings(&Settings::default()).await.unwrap();
        assert!(h.cache.get(CACHE_GROUP, &content_key(POST)).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_cache_resets_status() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        h.app.process_content(POST).await;
        assert_eq!(h.app.cache_status().await.unwrap().count, 1);

        h.app.clear_cache(&StaticAuthorizer::granted()).await.unwrap();

        let status = h.app.cache_status().await.unwrap();
        assert_eq!(status.count, 0);
        assert_eq!(status.size_bytes, 0);
        assert!(h.app.cache_list().await.unwrap().is_empty());
        assert!(h.cache.get(CACHE_GROUP, &content_key(POST)).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_cache_denied_keeps_everything() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        h.app.process_content(POST).await;

        let result = h.app.clear_cache(&StaticAuthorizer::denied()).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert_eq!(h.app.cache_status().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_cache_list_reports_entries() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        h.app.process_content(POST).await;

        let items = h.app.cache_list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].domain, "example.com");
        assert_eq!(items[0].file, "example.com.png");
        assert_eq!(items[0].size, 3);
    }

    #[tokio::test]
    async fn test_autotest_success() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        let report = h.app.autotest("https://rust-lang.org").await.unwrap();

        assert!(report.favicon_path.ends_with("favicons/rust-lang.org.png"));
        assert_ne!(report.original, report.processed);
        assert!(report.processed.contains(ICON_CLASS));
    }

    #[tokio::test]
    async fn test_autotest_rejects_internal_url() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        let failure = h.app.autotest("https://blog.test/about").await.unwrap_err();

        assert_eq!(failure.step, AutotestStep::UrlValidation);
        assert_eq!(h.http.calls(), 0);
    }

    #[tokio::test]
    async fn test_autotest_reports_fetch_failure() {
        let h = harness(StubHttpClient::failing()).await;
        let failure = h.app.autotest("https://rust-lang.org").await.unwrap_err();
        assert_eq!(failure.step, AutotestStep::FaviconRetrieval);
    }

    #[test]
    fn test_autotest_fragment_escapes_url() {
        assert_eq!(
            autotest_fragment(r#"https://x.test/?q="a"&b=1"#),
            r#"<article><p>Testing external link to <a href="https://x.test/?q=&quot;a&quot;&amp;b=1">test website</a></p></article>"#
        );
    }

    #[tokio::test]
    async fn test_uninstall_leaves_nothing_behind() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        h.app.save_settings(&Settings { debug_mode: true, ..Settings::default() }).await.unwrap();
        h.app.process_content(POST).await;

        h.app.uninstall().await.unwrap();

        assert!(!h.dir.path().join("favicons").exists());
        assert_eq!(h.app.cache_status().await.unwrap().count, 0);
        for name in ALL_OPTIONS {
            assert!(h.db.get_option(name).await.unwrap().is_none(), "{name}");
        }
        assert!(h.cache.get(CACHE_GROUP, &content_key(POST)).await.is_none());
    }

    #[tokio::test]
    async fn test_uninstall_keeps_foreign_files() {
        let h = harness(StubHttpClient::ok(b"png")).await;
        let foreign = h.dir.path().join("favicons").join("README.txt");
        tokio::fs::write(&foreign, b"keep").await.unwrap();

        h.app.uninstall().await.unwrap();
        assert!(foreign.exists());
    }
}
