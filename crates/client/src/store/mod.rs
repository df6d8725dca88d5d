//! Two-tier favicon cache.
//!
//! The SQLite `transients` table maps `hash(domain)` to a file path with a
//! 30 day TTL; the favicon directory holds the bytes, one
//! `{sanitized-domain}.png` per domain. An entry counts only while the
//! record is live and the file exists. Reads never repair either side.

pub mod sanitize;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use prefixer_core::cache::hash::{NAMESPACE, favicon_key};
use prefixer_core::{AppConfig, Authorizer, CacheDb, Error};

pub use sanitize::sanitize_domain_filename;

/// Favicon index TTL.
pub fn favicon_ttl() -> Duration {
    Duration::days(30)
}

/// Totals reported by [`FaviconStore::get_cache_status`].
///
/// `count` comes from the index and `size_bytes` from the directory, so
/// orphaned files make them disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    /// Live index records. Expired rows are excluded even though they stay
    /// in the table until the next activation purges them.
    pub count: u64,
    pub size_bytes: u64,
}

/// One listed cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFavicon {
    /// File name without `.png`; lossy when sanitizing changed the domain.
    pub domain: String,
    pub file: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Favicon index plus payload directory.
#[derive(Clone, Debug)]
pub struct FaviconStore {
    db: CacheDb,
    upload_dir: PathBuf,
    upload_url: String,
}

impl FaviconStore {
    pub fn new(db: CacheDb, upload_dir: impl Into<PathBuf>, upload_url: impl Into<String>) -> Self {
        Self { db, upload_dir: upload_dir.into(), upload_url: upload_url.into() }
    }

    pub fn from_config(db: CacheDb, config: &AppConfig) -> Self {
        Self::new(db, config.upload_dir.clone(), config.upload_url.clone())
    }

    /// Directory holding the favicon files.
    pub fn favicon_dir(&self) -> PathBuf {
        self.upload_dir.join(prefixer_core::config::FAVICON_DIR_NAME)
    }

    /// Canonical file path for `domain`.
    pub fn favicon_path(&self, domain: &str) -> Result<PathBuf, Error> {
        let name = sanitize_domain_filename(domain);
        if name.is_empty() {
            return Err(Error::PersistFailed(format!("no usable file name for domain {domain:?}")));
        }
        Ok(self.favicon_dir().join(format!("{name}.png")))
    }

    /// Create the favicon directory tree.
    pub async fn ensure_favicon_dir(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(self.favicon_dir()).await?;
        Ok(())
    }

    /// Path of a live cached favicon for `domain`.
    pub async fn get_cached_favicon(&self, domain: &str) -> Result<Option<PathBuf>, Error> {
        let Some(value) = self.db.get_transient(&favicon_key(domain)).await? else {
            return Ok(None);
        };

        let path = PathBuf::from(value);
        if !is_file(&path).await {
            tracing::debug!(domain, path = %path.display(), "index entry points at a missing file");
            return Ok(None);
        }

        Ok(Some(path))
    }

    /// Record `filepath` as the favicon of `domain` for the next 30 days.
    pub async fn cache_favicon(&self, domain: &str, filepath: &Path) -> Result<(), Error> {
        self.db
            .set_transient(&favicon_key(domain), &filepath.to_string_lossy(), favicon_ttl())
            .await?;
        tracing::debug!(domain, path = %filepath.display(), "cached favicon");
        Ok(())
    }

    /// Write `bytes` as the favicon of `domain` and index it.
    ///
    /// The file is written to a temporary sibling and renamed into place,
    /// so concurrent writers for one domain never leave a torn file.
    pub async fn save_favicon(&self, domain: &str, bytes: Bytes) -> Result<PathBuf, Error> {
        let path = self.favicon_path(domain)?;
        let dir = self.favicon_dir();

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes))
            .await
            .map_err(|e| Error::PersistFailed(format!("write task failed: {e}")))?
            .map_err(|e| Error::PersistFailed(format!("{}: {e}", path.display())))?;

        self.cache_favicon(domain, &path).await?;
        Ok(path)
    }

    /// Clear the cache after checking administrative authority.
    pub async fn clear_cache(&self, authorizer: &dyn Authorizer) -> Result<(), Error> {
        authorizer.require_manage("clear the favicon cache")?;
        self.purge().await
    }

    /// Delete every index record and every `*.png` in the favicon directory.
    ///
    /// No authorization check; uninstall runs with implicit authority.
    pub async fn purge(&self) -> Result<(), Error> {
        let deleted = self.delete_favicon_transients().await?;
        let removed = self.delete_favicon_files().await?;
        tracing::debug!(records = deleted, files = removed, "favicon cache cleared");
        Ok(())
    }

    /// Delete every record in the favicon namespace.
    pub async fn delete_favicon_transients(&self) -> Result<u64, Error> {
        self.db.delete_transients(NAMESPACE).await
    }

    /// Delete every `*.png` in the favicon directory, indexed or not.
    ///
    /// Individual failures are logged and skipped. Returns how many files
    /// were removed.
    pub async fn delete_favicon_files(&self) -> Result<usize, Error> {
        let dir = self.favicon_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "png") {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to delete favicon file"),
            }
        }

        Ok(removed)
    }

    /// Live index record count and total size of the favicon directory.
    pub async fn get_cache_status(&self) -> Result<CacheStatus, Error> {
        let count = self.db.count_transients(NAMESPACE).await?;

        let mut size_bytes = 0;
        match tokio::fs::read_dir(self.favicon_dir()).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let metadata = entry.metadata().await?;
                    if metadata.is_file() {
                        size_bytes += metadata.len();
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(CacheStatus { count, size_bytes })
    }

    /// Live index entries whose file still exists, sorted by domain.
    pub async fn get_cached_favicons(&self) -> Result<Vec<CachedFavicon>, Error> {
        let mut items = Vec::new();

        for transient in self.db.list_transients(NAMESPACE).await? {
            let path = PathBuf::from(&transient.value);
            let Ok(metadata) = tokio::fs::metadata(&path).await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let domain = file.strip_suffix(".png").unwrap_or(&file).to_string();
            let modified = metadata.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());

            items.push(CachedFavicon { domain, file, size: metadata.len(), modified });
        }

        items.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(items)
    }

    /// Remove the favicon directory if it has no entries at all.
    pub async fn delete_favicon_directory_if_empty(&self) -> Result<bool, Error> {
        let dir = self.favicon_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        if entries.next_entry().await?.is_some() {
            return Ok(false);
        }

        tokio::fs::remove_dir(&dir).await?;
        Ok(true)
    }

    /// Public URL of a file under `upload_dir`.
    pub fn public_url(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.upload_dir).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.upload_url.trim_end_matches('/'), segments.join("/")))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(".favicon").suffix(".tmp").tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
