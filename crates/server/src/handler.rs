//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the purge tool implementations.
use std::sync::Arc;

use crate::tools::ToolState;
use crate::tools::purge_list::{PurgeListParams, list_impl};
use crate::tools::purge_post::{PurgePostParams, post_impl};
use crate::tools::purge_request::{PurgeRequestParams, request_impl};
use crate::tools::purge_site::{
    PurgeAllParams, PurgeErrorsParams, PurgeWidgetParams, all_impl, comment_widget_impl, errors_impl, feeds_impl,
    front_impl, pages_impl, widget_impl,
};

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
use tagpurge_core::{LiveSite, PurgeService};

/// The main MCP server handler for tagpurge.
#[derive(Clone)]
pub struct PurgeServer {
    tool_router: ToolRouter<Self>,
    state: ToolState,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PurgeServer {
    /// Create a new server handler over the live site store.
    pub fn new(service: Arc<PurgeService>, site: Arc<LiveSite>) -> Self {
        Self { tool_router: Self::tool_router(), state: ToolState { service, site } }
    }

    #[tool(description = "Bulk purge by category slugs, tag slugs, post ids or URLs. \
                          Entries are separated by newlines or commas; bad entries are reported and skipped.")]
    async fn purge_list(&self, params: Parameters<PurgeListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.state, params.0).await
    }

    #[tool(description = "Purge every page a changed post can appear on: the post, its neighbours, terms, \
                          author, archives and dates, per the configured purge-by-post policy. \
                          Pass the post's new state to record it in the site store first.")]
    async fn purge_post(&self, params: Parameters<PurgePostParams>) -> Result<CallToolResult, McpError> {
        post_impl(&self.state, params.0).await
    }

    #[tool(description = "Purge everything cached for this site, or for every site when scope is network.")]
    async fn purge_all(&self, params: Parameters<PurgeAllParams>) -> Result<CallToolResult, McpError> {
        all_impl(&self.state, params.0).await
    }

    #[tool(description = "Purge the front page.")]
    async fn purge_front(&self) -> Result<CallToolResult, McpError> {
        front_impl(&self.state)
    }

    #[tool(description = "Purge all pages.")]
    async fn purge_pages(&self) -> Result<CallToolResult, McpError> {
        pages_impl(&self.state)
    }

    #[tool(description = "Purge cached error pages, optionally the 403, 404 or 500 page specifically.")]
    async fn purge_errors(&self, params: Parameters<PurgeErrorsParams>) -> Result<CallToolResult, McpError> {
        errors_impl(&self.state, params.0)
    }

    #[tool(description = "Purge one widget instance from the shared and per-session caches.")]
    async fn purge_widget(&self, params: Parameters<PurgeWidgetParams>) -> Result<CallToolResult, McpError> {
        widget_impl(&self.state, params.0)
    }

    #[tool(description = "Purge the recent comments widget, if the site has one.")]
    async fn purge_comment_widget(&self) -> Result<CallToolResult, McpError> {
        comment_widget_impl(&self.state).await
    }

    #[tool(description = "Purge cached feeds. Does nothing when feeds are not cached.")]
    async fn purge_feeds(&self) -> Result<CallToolResult, McpError> {
        feeds_impl(&self.state)
    }

    #[tool(description = "Build the purge header for the end of a request: explicit tags, \
                          purge-this-page, purge-related and logout.")]
    async fn purge_request(&self, params: Parameters<PurgeRequestParams>) -> Result<CallToolResult, McpError> {
        request_impl(&self.state, params.0)
    }
}

impl ServerHandler for PurgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tagpurge".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
