//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    ProcessContentParams,
    cache::{clear_impl, list_impl, status_impl},
    process_content::process_impl,
};

use prefixer_client::FaviconPrefixer;
use prefixer_core::StaticAuthorizer;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for favicon-mcp.
#[derive(Clone)]
pub struct FaviconMcpServer {
    app: FaviconPrefixer,
    admin: StaticAuthorizer,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FaviconMcpServer {
    /// Create a new server handler around an opened application.
    ///
    /// Administrative tools are granted only when the configuration says so.
    pub fn new(app: FaviconPrefixer) -> Self {
        let admin = if app.config().allow_admin_tools { StaticAuthorizer::granted() } else { StaticAuthorizer::denied() };
        Self { app, admin, tool_router: Self::tool_router() }
    }

    /// Decorate outbound links of an HTML fragment with favicons.
    #[tool(
        description = "Prefix external links in an HTML fragment with their site's favicon. Returns the rewritten fragment and whether it changed. Pass post_type to apply the enabled-category filter."
    )]
    async fn process_content(&self, params: Parameters<ProcessContentParams>) -> Result<CallToolResult, McpError> {
        process_impl(&self.app, params.0).await
    }

    /// Report favicon cache statistics.
    #[tool(description = "Number of cached favicons and total size of the favicon directory in bytes.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.app).await
    }

    /// List cached favicons.
    #[tool(description = "List cached favicons with domain, file name, size in bytes and modification time.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.app).await
    }

    /// Clear the favicon cache.
    #[tool(
        description = "Delete every cached favicon record and file. Requires the server to run with allow_admin_tools."
    )]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.app, &self.admin).await
    }
}

impl ServerHandler for FaviconMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "favicon-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Rewrites HTML fragments so outbound links carry their site's favicon, and manages the favicon cache."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
