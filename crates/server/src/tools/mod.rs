//! MCP tool implementations.
//!
//! This module contains all tools exposed by the favicon-mcp server. Each
//! tool is a thin adapter over [`prefixer_client::FaviconPrefixer`].

pub mod cache;
pub mod process_content;

pub use process_content::{ProcessContentOutput, ProcessContentParams};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use prefixer_core::Error;

/// Serialize `output` as the single text item of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
