//! Site-wide purge tools.
//!
//! Purge-all, front page, pages, error pages, widgets and feeds.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tagpurge_core::purge::ERROR_PAGE_CODES;
use tagpurge_core::{AdminScope, PurgeAccumulator, RequestContext};

use super::{ToolState, finish};
use crate::error::ToolError;

/// Parameters for the purge_all tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PurgeAllParams {
    /// `network` purges every tenant of a multisite deployment.
    #[serde(default)]
    pub scope: AdminScope,
}

/// Parameters for the purge_errors tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PurgeErrorsParams {
    /// Status codes whose error pages to purge (403, 404, 500).
    #[serde(default)]
    pub codes: Vec<u16>,
}

/// Parameters for the purge_widget tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PurgeWidgetParams {
    /// Widget instance id, e.g. `text-3`.
    pub widget_id: String,
}

/// Run one accumulator operation and serialize the result.
fn run(state: &ToolState, scope: AdminScope, op: impl FnOnce(&mut PurgeAccumulator)) -> Result<CallToolResult, McpError> {
    let mut acc = PurgeAccumulator::new();
    op(&mut acc);
    finish(state, &mut acc, &mut RequestContext::default().with_scope(scope), Vec::new(), Vec::new())
}

pub async fn all_impl(state: &ToolState, params: PurgeAllParams) -> Result<CallToolResult, McpError> {
    if params.scope == AdminScope::Network {
        state.site.refresh().await?;
    }
    run(state, params.scope, |acc| acc.purge_all(state.service.deployment()))
}

pub fn front_impl(state: &ToolState) -> Result<CallToolResult, McpError> {
    run(state, AdminScope::Site, |acc| acc.purge_front(state.service.deployment()))
}

pub fn pages_impl(state: &ToolState) -> Result<CallToolResult, McpError> {
    run(state, AdminScope::Site, PurgeAccumulator::purge_pages)
}

pub fn errors_impl(state: &ToolState, params: PurgeErrorsParams) -> Result<CallToolResult, McpError> {
    if let Some(code) = params.codes.iter().find(|c| !ERROR_PAGE_CODES.contains(*c)) {
        return Err(ToolError::InvalidInput(format!("no cached error page for status {code}")).into());
    }
    run(state, AdminScope::Site, |acc| acc.purge_errors(&params.codes))
}

pub fn widget_impl(state: &ToolState, params: PurgeWidgetParams) -> Result<CallToolResult, McpError> {
    let widget_id = params.widget_id.trim();
    if widget_id.is_empty() {
        return Err(ToolError::InvalidInput("widget_id cannot be empty".into()).into());
    }
    run(state, AdminScope::Site, |acc| acc.purge_widget(widget_id))
}

pub async fn comment_widget_impl(state: &ToolState) -> Result<CallToolResult, McpError> {
    let site = state.site.refresh().await?;
    run(state, AdminScope::Site, |acc| acc.purge_comment_widget(site.as_ref()))
}

pub fn feeds_impl(state: &ToolState) -> Result<CallToolResult, McpError> {
    run(state, AdminScope::Site, |acc| acc.purge_feeds(state.service.feed_ttl()))
}
