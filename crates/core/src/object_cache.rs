//! Short-lived in-process object cache.
//!
//! Entries are grouped so one namespace can be flushed without touching
//! the rest. Each group is a bounded moka cache with per-entry TTL.

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Entries kept per group before the least useful ones are evicted.
pub const DEFAULT_GROUP_CAPACITY: u64 = 10_000;

/// Grouped string cache with per-entry TTL.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> Option<String>;

    async fn set(&self, group: &str, key: &str, value: String, ttl: Duration);

    /// Drop every entry of `group`.
    async fn flush_group(&self, group: &str);
}

#[derive(Clone)]
struct CachedObject {
    value: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was stored with; overwrites restart it.
struct EntryTtl;

impl Expiry<String, CachedObject> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &CachedObject, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self, _key: &String, value: &CachedObject, _updated_at: Instant, _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

type GroupCache = Cache<String, CachedObject>;

/// moka-backed [`ObjectCache`], one bounded cache per group.
#[derive(Clone)]
pub struct MemoryObjectCache {
    groups: Arc<RwLock<HashMap<String, GroupCache>>>,
    capacity: u64,
}

impl Default for MemoryObjectCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_GROUP_CAPACITY)
    }
}

impl MemoryObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` entries per group.
    pub fn with_capacity(capacity: u64) -> Self {
        Self { groups: Arc::default(), capacity }
    }

    async fn group(&self, group: &str) -> Option<GroupCache> {
        self.groups.read().await.get(group).cloned()
    }

    async fn group_or_create(&self, group: &str) -> GroupCache {
        if let Some(cache) = self.group(group).await {
            return cache;
        }

        let mut groups = self.groups.write().await;
        groups
            .entry(group.to_string())
            .or_insert_with(|| Cache::builder().max_capacity(self.capacity).expire_after(EntryTtl).build())
            .clone()
    }
}

#[async_trait]
impl ObjectCache for MemoryObjectCache {
    async fn get(&self, group: &str, key: &str) -> Option<String> {
        let cache = self.group(group).await?;
        cache.get(key).await.map(|cached| cached.value)
    }

    async fn set(&self, group: &str, key: &str, value: String, ttl: Duration) {
        let cache = self.group_or_create(group).await;
        cache.insert(key.to_string(), CachedObject { value, ttl }).await;
    }

    async fn flush_group(&self, group: &str) {
        let removed = self.groups.write().await.remove(group);
        if let Some(cache) = removed {
            tracing::debug!(group, entries = cache.entry_count(), "flushed object cache group");
            cache.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryObjectCache::new();
        cache.set("g", "k", "v".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("g", "k").await.as_deref(), Some("v"));
        assert!(cache.get("other", "k").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss() {
        let cache = MemoryObjectCache::new();
        cache.set("g", "short", "v".into(), Duration::from_millis(5)).await;
        cache.set("g", "long", "w".into(), Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get("g", "short").await.is_none());
        assert_eq!(cache.get("g", "long").await.as_deref(), Some("w"));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let cache = MemoryObjectCache::new();
        cache.set("g", "k", "old".into(), Duration::from_millis(5)).await;
        cache.set("g", "k", "new".into(), Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("g", "k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_group_is_bounded() {
        let cache = MemoryObjectCache::with_capacity(10);
        for i in 0..500 {
            cache.set("g", &format!("k{i}"), "v".into(), Duration::from_secs(3600)).await;
        }

        let group = cache.group("g").await.unwrap();
        group.run_pending_tasks().await;
        assert!(group.entry_count() <= 10, "held {}", group.entry_count());
    }

    #[tokio::test]
    async fn test_flush_group_is_scoped() {
        let cache = MemoryObjectCache::new();
        cache.set("a", "k", "1".into(), Duration::from_secs(60)).await;
        cache.set("b", "k", "2".into(), Duration::from_secs(60)).await;

        cache.flush_group("a").await;
        assert!(cache.get("a", "k").await.is_none());
        assert_eq!(cache.get("b", "k").await.as_deref(), Some("2"));

        cache.set("a", "k", "3".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("a", "k").await.as_deref(), Some("3"));
    }
}
