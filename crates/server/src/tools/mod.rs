//! MCP tool implementations.
//!
//! Every tool call is one purge cycle: a fresh accumulator is filled, the
//! purge header is serialized from it, and both are dropped when the call
//! returns.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tagpurge_core::purge::Notice;
use tagpurge_core::{LiveSite, PURGE_HEADER_NAME, PurgeAccumulator, PurgeService, RequestContext, Tag};

use crate::error::ToolError;

pub mod purge_list;
pub mod purge_post;
pub mod purge_request;
pub mod purge_site;

/// Shared state every tool reads from.
///
/// Tools that look content up call [`LiveSite::refresh`] first and work on
/// the snapshot it returns.
#[derive(Debug, Clone)]
pub struct ToolState {
    pub service: Arc<PurgeService>,
    pub site: Arc<LiveSite>,
}

/// Output shared by every purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PurgeOutput {
    /// Name of the response header to send.
    pub header_name: String,
    /// Header value; empty means no header should be sent.
    pub header: String,
    /// Per-entry messages, in input order.
    #[serde(default)]
    pub notices: Vec<Notice>,
    /// Tags resolved for a changed post.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_tags: Vec<Tag>,
}

/// Serialize the accumulator and wrap the result as a tool response.
pub(crate) fn finish(
    state: &ToolState, acc: &mut PurgeAccumulator, request: &mut RequestContext, notices: Vec<Notice>,
    resolved_tags: Vec<Tag>,
) -> Result<CallToolResult, McpError> {
    let header = state.service.output(acc, request);
    let output = PurgeOutput { header_name: PURGE_HEADER_NAME.to_string(), header, notices, resolved_tags };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| ToolError::OutputFailed(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use tagpurge_core::content::{CATEGORY_TAXONOMY, PostStatus, WidgetKind};
    use tagpurge_core::purge::HookRegistry;
    use tagpurge_core::{AppConfig, PostRecord, SiteDb};

    use super::*;

    pub fn record(id: u64, status: PostStatus) -> PostRecord {
        PostRecord {
            id,
            status,
            post_type: "post".into(),
            author_id: 3,
            published_at: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 30, 0).unwrap(),
            permalink: Some(format!("https://example.com/post-{id}/")),
        }
    }

    pub async fn state_with(config: AppConfig) -> ToolState {
        let db = SiteDb::open_in_memory().await.unwrap();
        for (id, status) in [(5, PostStatus::Publish), (6, PostStatus::Pending)] {
            db.upsert_post(&record(id, status)).await.unwrap();
        }
        db.register_taxonomy("post", CATEGORY_TAXONOMY).await.unwrap();
        db.upsert_term(10, CATEGORY_TAXONOMY, "news").await.unwrap();
        db.upsert_term(11, CATEGORY_TAXONOMY, "sport").await.unwrap();
        db.assign_term(5, 10).await.unwrap();
        db.set_widget(WidgetKind::RecentComments, "recent-comments-2").await.unwrap();
        for id in [1, 2] {
            db.add_tenant(id, None).await.unwrap();
        }

        let site = Arc::new(LiveSite::load(db).await.unwrap());
        let service = PurgeService::new(&config, site.clone(), HookRegistry::new(), None).unwrap();
        ToolState { service: Arc::new(service), site }
    }

    pub async fn state() -> ToolState {
        state_with(AppConfig { site_url: "https://example.com".into(), ..Default::default() }).await
    }

    pub fn output_of(result: &CallToolResult) -> PurgeOutput {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
