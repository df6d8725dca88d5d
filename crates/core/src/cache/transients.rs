//! Expiring key/value records.
//!
//! A transient is live while `expires_at` is NULL or in the future. Reads
//! never delete expired rows; that is left to the explicit purge calls.
//! Namespaces are plain name prefixes matched with `substr` so `_` and `%`
//! in a prefix are literal.

use super::connection::CacheDb;
use crate::Error;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored transient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transient {
    pub name: String,
    pub value: String,
    /// Unix timestamp (seconds) after which the row is stale.
    pub expires_at: Option<i64>,
}

impl CacheDb {
    /// Insert or replace a transient that expires `ttl` from now.
    pub async fn set_transient(&self, name: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        let name = name.to_string();
        let value = value.to_string();
        let expires_at = (Utc::now() + ttl).timestamp();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO transients (name, value, expires_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                        value = excluded.value,
                        expires_at = excluded.expires_at",
                    params![name, value, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a live transient value by name.
    ///
    /// Returns None if the name doesn't exist or the row has expired.
    pub async fn get_transient(&self, name: &str) -> Result<Option<String>, Error> {
        let name = name.to_string();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value FROM transients
                     WHERE name = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                    params![name, now],
                    |row| row.get(0),
                );

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List live transients whose name starts with `prefix`, ordered by name.
    pub async fn list_transients(&self, prefix: &str) -> Result<Vec<Transient>, Error> {
        let prefix = prefix.to_string();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| -> Result<Vec<Transient>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT name, value, expires_at FROM transients
                     WHERE substr(name, 1, length(?1)) = ?1
                     AND (expires_at IS NULL OR expires_at > ?2)
                     ORDER BY name",
                )?;

                let rows = stmt.query_map(params![prefix, now], |row| {
                    Ok(Transient { name: row.get(0)?, value: row.get(1)?, expires_at: row.get(2)? })
                })?;

                let mut items = Vec::new();
                for row in rows {
                    items.push(row?);
                }
                Ok(items)
            })
            .await
            .map_err(Error::from)
    }

    /// Count live transients whose name starts with `prefix`.
    pub async fn count_transients(&self, prefix: &str) -> Result<u64, Error> {
        let prefix = prefix.to_string();
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM transients
                     WHERE substr(name, 1, length(?1)) = ?1
                     AND (expires_at IS NULL OR expires_at > ?2)",
                    params![prefix, now],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every transient (live or expired) whose name starts with `prefix`.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_transients(&self, prefix: &str) -> Result<u64, Error> {
        let prefix = prefix.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count =
                    conn.execute("DELETE FROM transients WHERE substr(name, 1, length(?1)) = ?1", params![prefix])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired transients across all namespaces.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_transients(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM transients WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_transient("favicon_prefixer_a", "/tmp/a.png", Duration::days(30))
            .await
            .unwrap();

        let value = db.get_transient("favicon_prefixer_a").await.unwrap();
        assert_eq!(value.as_deref(), Some("/tmp/a.png"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_transient("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_transient("k", "first", Duration::days(1)).await.unwrap();
        db.set_transient("k", "second", Duration::days(1)).await.unwrap();

        assert_eq!(db.get_transient("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(db.count_transients("k").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_is_miss_but_kept() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_transient("favicon_prefixer_old", "v", Duration::seconds(-10))
            .await
            .unwrap();

        assert!(db.get_transient("favicon_prefixer_old").await.unwrap().is_none());
        assert_eq!(db.count_transients("favicon_prefixer_").await.unwrap(), 0);

        assert_eq!(db.purge_expired_transients().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prefix_is_literal() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_transient("favicon_prefixer_a", "1", Duration::days(1)).await.unwrap();
        db.set_transient("faviconXprefixerXb", "2", Duration::days(1)).await.unwrap();
        db.set_transient("other_c", "3", Duration::days(1)).await.unwrap();

        let listed = db.list_transients("favicon_prefixer_").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "favicon_prefixer_a");

        assert_eq!(db.delete_transients("favicon_prefixer_").await.unwrap(), 1);
        assert_eq!(db.get_transient("other_c").await.unwrap().as_deref(), Some("3"));
        assert_eq!(db.get_transient("faviconXprefixerXb").await.unwrap().as_deref(), Some("2"));
    }
}
