//! Persisted options backing [`ConfigStore`].

use super::connection::CacheDb;
use crate::Error;
use crate::settings::ConfigStore;
use async_trait::async_trait;
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Get a raw JSON option value by name.
    pub async fn get_option(&self, name: &str) -> Result<Option<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT value FROM options WHERE name = ?1", params![name], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a raw JSON option value.
    pub async fn set_option(&self, name: &str, value: &str) -> Result<(), Error> {
        let name = name.to_string();
        let value = value.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO options (name, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![name, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an option. Returns whether a row was removed.
    pub async fn delete_option(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM options WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl ConfigStore for CacheDb {
    async fn get(&self, name: &str) -> Result<Option<Value>, Error> {
        match self.get_option(name).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, name: &str, value: Value) -> Result<(), Error> {
        let raw = serde_json::to_string(&value)?;
        self.set_option(name, &raw).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_option(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_option_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        ConfigStore::set(&db, "favicon_prefixer_post_types", json!(["post", "page"]))
            .await
            .unwrap();

        let value = ConfigStore::get(&db, "favicon_prefixer_post_types").await.unwrap();
        assert_eq!(value, Some(json!(["post", "page"])));
    }

    #[tokio::test]
    async fn test_option_delete() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_option("favicon_prefixer_debug_mode", "true").await.unwrap();

        assert!(db.delete_option("favicon_prefixer_debug_mode").await.unwrap());
        assert!(!db.delete_option("favicon_prefixer_debug_mode").await.unwrap());
        assert!(db.get_option("favicon_prefixer_debug_mode").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_option_is_error() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set_option("favicon_prefixer_debug_mode", "{not json").await.unwrap();

        let result = ConfigStore::get(&db, "favicon_prefixer_debug_mode").await;
        assert!(matches!(result, Err(Error::InvalidOption(_))));
    }
}
