//! cache_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;
use prefixer_client::FaviconPrefixer;

/// One cached favicon.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListItem {
    /// Domain as recovered from the file name.
    pub domain: String,
    pub file: String,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time (RFC 3339).
    pub modified: String,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub items: Vec<CacheListItem>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(app: &FaviconPrefixer) -> Result<CallToolResult, McpError> {
    let items = app
        .cache_list()
        .await?
        .into_iter()
        .map(|item| CacheListItem {
            domain: item.domain,
            file: item.file,
            size: item.size,
            modified: item.modified.to_rfc3339(),
        })
        .collect();

    json_result(&CacheListOutput { items })
}
