//! Per-request inputs to header output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// Who triggered the purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminScope {
    /// A single site's own admin, or a front-end request.
    #[default]
    Site,
    /// A network administrator acting across every tenant.
    Network,
}

/// Response cache-control state the purge engine reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControl {
    stale: bool,
}

impl CacheControl {
    /// Mark the response as served from an entry that is being replaced.
    pub fn set_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

/// What the output builder needs to know about the current request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Path and query of the request, as received.
    pub request_uri: String,
    pub admin_scope: AdminScope,
    /// Tags the current response was rendered with.
    pub rendered_tags: Vec<Tag>,
    pub control: CacheControl,
}

impl RequestContext {
    pub fn new(request_uri: impl Into<String>) -> Self {
        Self { request_uri: request_uri.into(), ..Default::default() }
    }

    pub fn with_scope(mut self, scope: AdminScope) -> Self {
        self.admin_scope = scope;
        self
    }

    pub fn with_rendered_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.rendered_tags.extend(tags);
        self
    }
}
