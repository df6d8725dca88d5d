//! cache_clear tool implementation.
//!
//! Administrative: refused unless the server runs with `allow_admin_tools`.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;
use prefixer_client::FaviconPrefixer;
use prefixer_core::Authorizer;

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    pub cleared: bool,
    /// Index entries left afterwards; always 0 on success.
    pub remaining: u64,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(app: &FaviconPrefixer, authorizer: &dyn Authorizer) -> Result<CallToolResult, McpError> {
    app.clear_cache(authorizer).await?;
    let status = app.cache_status().await?;

    tracing::info!("favicon cache cleared over MCP");
    json_result(&CacheClearOutput { cleared: true, remaining: status.count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{parse_output, test_app};
    use prefixer_core::StaticAuthorizer;

    #[tokio::test]
    async fn test_clear_when_allowed() {
        let t = test_app(true).await;
        t.app
            .process_content(r#"<a href="https://example.com">x</a>"#)
            .await;

        let output: CacheClearOutput =
            parse_output(&clear_impl(&t.app, &StaticAuthorizer::granted()).await.unwrap());
        assert!(output.cleared);
        assert_eq!(output.remaining, 0);
    }

    #[tokio::test]
    async fn test_clear_refused() {
        let t = test_app(false).await;
        t.app
            .process_content(r#"<a href="https://example.com">x</a>"#)
            .await;

        let err = clear_impl(&t.app, &StaticAuthorizer::denied()).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
        assert_eq!(t.app.cache_status().await.unwrap().count, 1);
    }
}
