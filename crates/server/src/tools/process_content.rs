//! process_content tool implementation.
//!
//! Runs an HTML fragment through the favicon rewriter. With a post type
//! the category gate applies first, exactly as for published content.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use prefixer_client::FaviconPrefixer;

/// Input parameters for the process_content tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessContentParams {
    /// The HTML fragment to rewrite.
    pub content: String,

    /// Content category of the fragment (e.g. "post").
    /// When omitted the fragment is rewritten regardless of category.
    #[serde(default)]
    pub post_type: Option<String>,
}

/// Output structure for the process_content tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessContentOutput {
    /// The rewritten fragment, or the input when nothing changed.
    pub content: String,
    /// Whether any link was decorated.
    pub modified: bool,
}

/// Implementation of the process_content tool.
pub async fn process_impl(app: &FaviconPrefixer, params: ProcessContentParams) -> Result<CallToolResult, McpError> {
    let content = match params.post_type.as_deref() {
        Some(post_type) => app.filter_content(&params.content, post_type).await,
        None => app.process_content(&params.content).await,
    };

    let modified = content != params.content;
    tracing::debug!(modified, post_type = ?params.post_type, "processed content");

    json_result(&ProcessContentOutput { content, modified })
}
