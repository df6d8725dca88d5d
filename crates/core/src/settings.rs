//! Editorial settings persisted through a [`ConfigStore`].
//!
//! Option names keep the `favicon_prefixer_` prefix so uninstall can find
//! every one of them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

pub const OPTION_POST_TYPES: &str = "favicon_prefixer_post_types";
pub const OPTION_IGNORE_INTERNAL: &str = "favicon_prefixer_ignore_internal";
pub const OPTION_DEBUG_MODE: &str = "favicon_prefixer_debug_mode";

/// Every option this crate owns.
pub const ALL_OPTIONS: &[&str] = &[OPTION_POST_TYPES, OPTION_IGNORE_INTERNAL, OPTION_DEBUG_MODE];

/// Named JSON option storage.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Value>, Error>;

    async fn set(&self, name: &str, value: Value) -> Result<(), Error>;

    /// Returns whether the option existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;
}

/// Typed view over the plugin options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Content categories whose bodies get favicons.
    pub post_types: Vec<String>,
    /// Skip links pointing at the site itself.
    pub ignore_internal: bool,
    /// Emit debug-level logs for the silent failure paths.
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { post_types: vec!["post".to_string()], ignore_internal: true, debug_mode: false }
    }
}

impl Settings {
    /// Load settings, falling back to defaults for missing options.
    ///
    /// A stored value of the wrong JSON type is treated as missing.
    pub async fn load(store: &dyn ConfigStore) -> Result<Self, Error> {
        let defaults = Self::default();

        let post_types = match store.get(OPTION_POST_TYPES).await? {
            Some(value) => serde_json::from_value(value).unwrap_or(defaults.post_types),
            None => defaults.post_types,
        };

        Ok(Self {
            post_types,
            ignore_internal: load_bool(store, OPTION_IGNORE_INTERNAL, defaults.ignore_internal).await?,
            debug_mode: load_bool(store, OPTION_DEBUG_MODE, defaults.debug_mode).await?,
        })
    }

    /// Persist every field.
    pub async fn save(&self, store: &dyn ConfigStore) -> Result<(), Error> {
        store
            .set(OPTION_POST_TYPES, serde_json::to_value(sanitize_post_types(&self.post_types))?)
            .await?;
        store.set(OPTION_IGNORE_INTERNAL, Value::Bool(self.ignore_internal)).await?;
        store.set(OPTION_DEBUG_MODE, Value::Bool(self.debug_mode)).await
    }

    /// Whether content of `post_type` should be rewritten.
    pub fn is_enabled_post_type(&self, post_type: &str) -> bool {
        self.post_types.iter().any(|t| t == post_type)
    }

    /// Remove every option this crate owns.
    pub async fn delete_all(store: &dyn ConfigStore) -> Result<(), Error> {
        for name in ALL_OPTIONS {
            store.delete(name).await?;
        }
        Ok(())
    }
}

async fn load_bool(store: &dyn ConfigStore, name: &str, default: bool) -> Result<bool, Error> {
    Ok(store.get(name).await?.and_then(|v| v.as_bool()).unwrap_or(default))
}

fn sanitize_post_types(types: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in types.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|existing| existing == t) {
            out.push(t.to_string());
        }
    }
    out
}
