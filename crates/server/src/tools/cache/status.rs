//! cache_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;
use prefixer_client::FaviconPrefixer;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    /// Number of live favicon index entries.
    pub count: u64,
    /// Total bytes of every file in the favicon directory.
    pub size_bytes: u64,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(app: &FaviconPrefixer) -> Result<CallToolResult, McpError> {
    let status = app.cache_status().await?;
    json_result(&CacheStatusOutput { count: status.count, size_bytes: status.size_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{parse_output, test_app};

    #[tokio::test]
    async fn test_status_empty() {
        let t = test_app(false).await;
        let output: CacheStatusOutput = parse_output(&status_impl(&t.app).await.unwrap());
        assert_eq!(output.count, 0);
        assert_eq!(output.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_status_after_processing() {
        let t = test_app(false).await;
        t.app
            .process_content(r#"<a href="https://example.com">x</a>"#)
            .await;

        let output: CacheStatusOutput = parse_output(&status_impl(&t.app).await.unwrap());
        assert_eq!(output.count, 1);
        assert_eq!(output.size_bytes, 3);
    }
}
