//! purge_list tool implementation.
//!
//! Bulk purge by category, tag, post id or URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tagpurge_core::purge::PurgeListForm;
use tagpurge_core::{PurgeAccumulator, RequestContext};

use super::{ToolState, finish};

/// Parameters for the purge_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PurgeListParams {
    /// Entry kind: `category`, `post_id`, `tag` or `url`.
    pub select: Option<String>,

    /// Entries, one per line or comma separated.
    pub list: Option<String>,
}

/// Implementation of the purge_list tool.
pub async fn list_impl(state: &ToolState, params: PurgeListParams) -> Result<CallToolResult, McpError> {
    let form = PurgeListForm { select: params.select, list: params.list };
    let site = state.site.refresh().await?;

    let mut acc = PurgeAccumulator::new();
    let notices = state.service.purge_list(&mut acc, site.as_ref(), &form)?;

    finish(state, &mut acc, &mut RequestContext::default(), notices, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output_of, state};
    use tagpurge_core::purge::NoticeLevel;

    fn params(select: &str, list: &str) -> PurgeListParams {
        PurgeListParams { select: Some(select.into()), list: Some(list.into()) }
    }

    #[tokio::test]
    async fn test_category_list() {
        let result = list_impl(&state().await, params("category", "news")).await.unwrap();
        let output = output_of(&result);
        assert_eq!(output.header_name, "X-LiteSpeed-Purge");
        assert_eq!(output.header, "public,tag=lsc1_term:10");
        assert_eq!(output.notices.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_entries_reported_not_fatal() {
        let result = list_impl(&state().await, params("url", "/ok/,/<script>/")).await.unwrap();
        let output = output_of(&result);
        assert!(output.header.starts_with("public,tag=lsc1_url-hash:"));
        assert_eq!(output.notices[1].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_all_entries_rejected_sends_no_header() {
        let result = list_impl(&state().await, params("post_id", "6")).await.unwrap();
        let output = output_of(&result);
        assert_eq!(output.header, "");
        assert_eq!(output.notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_term_added_after_startup() {
        let state = state().await;
        state.site.db().upsert_term(12, "category", "weather").await.unwrap();
        let output = output_of(&list_impl(&state, params("category", "weather")).await.unwrap());
        assert_eq!(output.header, "public,tag=lsc1_term:12");
    }

    #[tokio::test]
    async fn test_malformed_form_is_error() {
        let err = list_impl(&state().await, PurgeListParams { select: None, list: Some("x".into()) }).await.unwrap_err();
        assert_eq!(err.code.0, -32006);
        let err = list_impl(&state().await, params("tag", "")).await.unwrap_err();
        assert_eq!(err.code.0, -32005);
    }
}
