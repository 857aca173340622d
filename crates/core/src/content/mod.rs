//! Collaborators the purge engine reads from.
//!
//! The engine never owns content. It asks a [`ContentSource`] about posts,
//! terms and widgets, a [`TenantDirectory`] about the sites of a network,
//! and pokes a [`CrawlerControl`] after a purge-all. All three are read-only
//! from the engine's side and must tolerate concurrent callers.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

pub mod index;

pub use index::SiteIndex;

/// Content type whose posts have chronological neighbours.
pub const DEFAULT_POST_TYPE: &str = "post";
/// Taxonomy that backs purge-by-category.
pub const CATEGORY_TAXONOMY: &str = "category";
/// Taxonomy that backs purge-by-tag.
pub const TAG_TAXONOMY: &str = "post_tag";

/// Lifecycle status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    #[serde(rename = "auto-draft")]
    AutoDraft,
    Inherit,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Future => "future",
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Private => "private",
            PostStatus::Trash => "trash",
            PostStatus::AutoDraft => "auto-draft",
            PostStatus::Inherit => "inherit",
        }
    }

    /// Statuses whose changes can affect cached pages.
    pub fn triggers_purge(self) -> bool {
        matches!(self, PostStatus::Publish | PostStatus::Trash | PostStatus::Private | PostStatus::Draft)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(PostStatus::Publish),
            "future" => Ok(PostStatus::Future),
            "draft" => Ok(PostStatus::Draft),
            "pending" => Ok(PostStatus::Pending),
            "private" => Ok(PostStatus::Private),
            "trash" => Ok(PostStatus::Trash),
            "auto-draft" => Ok(PostStatus::AutoDraft),
            "inherit" => Ok(PostStatus::Inherit),
            other => Err(Error::InvalidInput(format!("unknown post status: {other}"))),
        }
    }
}

/// The fields of a post that tag derivation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub status: PostStatus,
    pub post_type: String,
    pub author_id: u64,
    pub published_at: NaiveDateTime,
}

/// Chronologically adjacent published posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjacent {
    pub previous: Option<u64>,
    pub next: Option<u64>,
}

/// Site-wide widgets whose output depends on other content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    RecentPosts,
    RecentComments,
}

impl WidgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::RecentPosts => "recent_posts",
            WidgetKind::RecentComments => "recent_comments",
        }
    }
}

impl FromStr for WidgetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent_posts" => Ok(WidgetKind::RecentPosts),
            "recent_comments" => Ok(WidgetKind::RecentComments),
            other => Err(Error::InvalidInput(format!("unknown widget kind: {other}"))),
        }
    }
}

/// Entity lookups consulted while deriving tags.
pub trait ContentSource: Send + Sync {
    fn post(&self, id: u64) -> Option<Post>;

    /// Absolute or site-relative URL of the post, if it has one.
    fn permalink(&self, id: u64) -> Option<String>;

    /// Published posts of the same content type immediately before and after `id`.
    fn adjacent_posts(&self, id: u64) -> Adjacent;

    /// Taxonomies registered against a content type.
    fn taxonomies_for(&self, post_type: &str) -> Vec<String>;

    /// Term ids assigned to a post under one taxonomy.
    fn terms_for(&self, post_id: u64, taxonomy: &str) -> Vec<u64>;

    /// Whether the content type has a public archive listing.
    fn has_archive(&self, post_type: &str) -> bool;

    /// Instance id of an active widget of this kind.
    fn widget_instance(&self, kind: WidgetKind) -> Option<String>;

    fn term_by_slug(&self, taxonomy: &str, slug: &str) -> Option<u64>;
}

/// Enumerates the tenants of a multi-site deployment.
pub trait TenantDirectory: Send + Sync {
    /// # Errors
    ///
    /// Returns `Error::TenantListUnavailable` when the list cannot be produced.
    fn tenant_ids(&self) -> Result<Vec<u64>, Error>;
}

/// Background crawler that walks the site to re-warm the cache.
pub trait CrawlerControl: Send + Sync {
    /// Restart the crawl from the first URL.
    fn reset_position(&self);
}
