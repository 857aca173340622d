//! purge_request tool implementation.
//!
//! Emits the purge header for the end of a front-end request: explicit
//! tags, the purge-this-page and purge-related flags, and logout.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tagpurge_core::{PurgeAccumulator, RequestContext, Tag};

use super::{ToolState, finish};
use crate::error::ToolError;

/// Parameters for the purge_request tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PurgeRequestParams {
    /// Path and query of the request.
    pub request_uri: String,

    /// Tags the response was rendered with.
    #[serde(default)]
    pub rendered_tags: Vec<Tag>,

    /// Tags to purge from the shared cache.
    #[serde(default)]
    pub public_tags: Vec<Tag>,

    /// Tags to purge from the per-session cache.
    #[serde(default)]
    pub private_tags: Vec<Tag>,

    /// Purge the page at `request_uri`.
    #[serde(default)]
    pub single: bool,

    /// Purge every tag in `rendered_tags`.
    #[serde(default)]
    pub related: bool,

    /// The session is logging out.
    #[serde(default)]
    pub logout: bool,

    /// The response was served from an entry being replaced.
    #[serde(default)]
    pub stale: bool,
}

/// Implementation of the purge_request tool.
pub fn request_impl(state: &ToolState, params: PurgeRequestParams) -> Result<CallToolResult, McpError> {
    if params.single && params.request_uri.trim().is_empty() {
        return Err(ToolError::InvalidInput("request_uri is required for a single-page purge".into()).into());
    }

    let mut acc = PurgeAccumulator::new();
    acc.add_public(params.public_tags);
    acc.add_private(params.private_tags);
    if params.single {
        acc.request_single_purge();
    }
    if params.related {
        acc.request_related_purge();
    }
    if params.logout {
        acc.purge_on_logout();
    }

    let mut request = RequestContext::new(params.request_uri).with_rendered_tags(params.rendered_tags);
    if params.stale {
        request.control.set_stale();
    }

    finish(state, &mut acc, &mut request, Vec::new(), Vec::new())
}
