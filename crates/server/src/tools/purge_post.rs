//! purge_post tool implementation.
//!
//! Purges everything a changed post can appear on. The caller may report
//! the post's new state along with the change; it is written to the site
//! store before tags are resolved.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tagpurge_core::content::{DEFAULT_POST_TYPE, PostStatus};
use tagpurge_core::store::parse_published_at;
use tagpurge_core::{PostRecord, PurgeAccumulator, RequestContext};

use super::{ToolState, finish};

/// New state of a changed post.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostChange {
    pub status: PostStatus,

    /// Content type; defaults to `post`.
    #[serde(default = "default_post_type")]
    pub post_type: String,

    pub author_id: u64,

    /// Publish time as `YYYY-MM-DD HH:MM:SS`.
    pub published_at: String,

    #[serde(default)]
    pub permalink: Option<String>,

    /// Full list of assigned term ids. Omit to keep the stored assignment.
    #[serde(default)]
    pub term_ids: Option<Vec<u64>>,
}

fn default_post_type() -> String {
    DEFAULT_POST_TYPE.to_string()
}

/// Parameters for the purge_post tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PurgePostParams {
    /// Id of the post that changed.
    pub post_id: u64,

    /// New state of the post, if the store has not seen it yet.
    #[serde(default)]
    pub post: Option<PostChange>,

    /// URI of the request that changed it (optional).
    #[serde(default)]
    pub request_uri: Option<String>,
}

/// Implementation of the purge_post tool.
pub async fn post_impl(state: &ToolState, params: PurgePostParams) -> Result<CallToolResult, McpError> {
    let site = match params.post {
        Some(change) => {
            let record = PostRecord {
                id: params.post_id,
                status: change.status,
                post_type: change.post_type,
                author_id: change.author_id,
                published_at: parse_published_at(&change.published_at)?,
                permalink: change.permalink,
            };
            state.site.record_post(&record, change.term_ids.as_deref()).await?
        }
        None => state.site.refresh().await?,
    };

    let mut acc = PurgeAccumulator::new();
    let mut request = RequestContext::new(params.request_uri.unwrap_or_default());

    let resolved = state
        .service
        .purge_post(&mut acc, &mut request, site.as_ref(), params.post_id)?
        .map(|tags| tags.into_vec())
        .unwrap_or_default();

    finish(state, &mut acc, &mut request, Vec::new(), resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output_of, record, state, state_with};
    use tagpurge_core::{AppConfig, PurgeCategory, PurgePolicy, Tag};

    fn params(post_id: u64) -> PurgePostParams {
        PurgePostParams { post_id, post: None, request_uri: None }
    }

    fn change(status: PostStatus, term_ids: Option<Vec<u64>>) -> PostChange {
        PostChange {
            status,
            post_type: "post".into(),
            author_id: 3,
            published_at: "2024-06-02 10:00:00".into(),
            permalink: Some("https://example.com/fresh/".into()),
            term_ids,
        }
    }

    fn term_state_config() -> AppConfig {
        AppConfig {
            site_url: "https://example.com".into(),
            purge_by_post: PurgePolicy::new([PurgeCategory::Term]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_published_post() {
        let result = post_impl(&state_with(term_state_config()).await, params(5)).await.unwrap();
        let output = output_of(&result);

        assert!(output.header.starts_with("public,stale,tag=lsc1_post:5,lsc1_url-hash:"));
        assert!(output.header.ends_with(",lsc1_term:10"));
        assert_eq!(output.resolved_tags.first(), Some(&Tag::post(5)));
    }

    #[tokio::test]
    async fn test_pending_post_sends_no_header() {
        let result = post_impl(&state().await, params(6)).await.unwrap();
        let output = output_of(&result);
        assert_eq!(output.header, "");
        assert!(output.resolved_tags.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_post() {
        let err = post_impl(&state().await, params(99)).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_post_stored_after_startup_is_found() {
        let state = state().await;
        state.site.db().upsert_post(&record(7, PostStatus::Publish)).await.unwrap();

        let output = output_of(&post_impl(&state, params(7)).await.unwrap());
        assert_eq!(output.resolved_tags.first(), Some(&Tag::post(7)));
    }

    #[tokio::test]
    async fn test_reported_change_is_recorded_before_resolving() {
        let state = state_with(term_state_config()).await;

        let new_post = PurgePostParams { post_id: 8, post: Some(change(PostStatus::Publish, None)), request_uri: None };
        let output = output_of(&post_impl(&state, new_post).await.unwrap());
        assert_eq!(output.resolved_tags.first(), Some(&Tag::post(8)));

        let retagged =
            PurgePostParams { post_id: 5, post: Some(change(PostStatus::Publish, Some(vec![11]))), request_uri: None };
        let output = output_of(&post_impl(&state, retagged).await.unwrap());
        assert!(output.resolved_tags.contains(&Tag::term(11)));
        assert!(!output.resolved_tags.contains(&Tag::term(10)));
    }

    #[tokio::test]
    async fn test_status_change_to_pending_is_seen() {
        let state = state().await;
        let unpublished = PurgePostParams { post_id: 5, post: Some(change(PostStatus::Pending, None)), request_uri: None };
        let output = output_of(&post_impl(&state, unpublished).await.unwrap());
        assert_eq!(output.header, "");
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_invalid_input() {
        let mut bad = change(PostStatus::Publish, None);
        bad.published_at = "yesterday".into();
        let err = post_impl(&state().await, PurgePostParams { post_id: 5, post: Some(bad), request_uri: None })
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
