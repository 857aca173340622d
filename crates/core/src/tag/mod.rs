//! Canonical cache tag identifiers.
//!
//! Every cached object is labelled with one or more tags when it is stored;
//! a purge names tags, never objects. Tags are plain ASCII strings of the
//! form `<type>:<key>` (or a bare `<type>` for site-wide singletons). The
//! wildcard `*` is reserved and means "everything in this scope".

use std::fmt;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod set;
pub mod url;

pub use set::{TagSet, dedup_in_place};
pub use url::{SiteOrigin, URL_TAG_PREFIX, normalize_path, url_tag};

const WILDCARD: &str = "*";
const POST: &str = "post:";
const TERM: &str = "term:";
const AUTHOR: &str = "author:";
const DATE: &str = "date:";
const WIDGET: &str = "widget:";
const POST_TYPE: &str = "posttype:";
const FRONT_PAGE: &str = "frontpage";
const HOME: &str = "home";
const PAGES: &str = "pages";
const PAGES_WITH_RECENT_POSTS: &str = "pages_with_recent_posts";
const FEED: &str = "feed";
const ERROR: &str = "error";

/// Granularity of a date archive tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    /// `yyyymmdd`
    Day,
    /// `yyyymm`
    Month,
    /// `yyyy`
    Year,
}

impl DateGranularity {
    fn format(self) -> &'static str {
        match self {
            DateGranularity::Day => "%Y%m%d",
            DateGranularity::Month => "%Y%m",
            DateGranularity::Year => "%Y",
        }
    }
}

/// An opaque, case-sensitive invalidation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Wrap an already-formed tag string.
    ///
    /// No validation happens here; tags recorded by the response tag tracker
    /// arrive through this constructor and may be empty.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The reserved purge-everything tag.
    pub fn wildcard() -> Self {
        Self(WILDCARD.into())
    }

    pub fn post(id: u64) -> Self {
        Self(format!("{POST}{id}"))
    }

    pub fn term(id: u64) -> Self {
        Self(format!("{TERM}{id}"))
    }

    pub fn author(id: u64) -> Self {
        Self(format!("{AUTHOR}{id}"))
    }

    /// Date archive tag at the given granularity.
    pub fn date(date: NaiveDate, granularity: DateGranularity) -> Self {
        Self(format!("{DATE}{}", date.format(granularity.format())))
    }

    pub fn widget(widget_id: &str) -> Self {
        Self(format!("{WIDGET}{widget_id}"))
    }

    /// Archive listing of a content type.
    pub fn post_type_archive(post_type: &str) -> Self {
        Self(format!("{POST_TYPE}{post_type}"))
    }

    pub fn front_page() -> Self {
        Self(FRONT_PAGE.into())
    }

    pub fn home() -> Self {
        Self(HOME.into())
    }

    pub fn pages() -> Self {
        Self(PAGES.into())
    }

    pub fn pages_with_recent_posts() -> Self {
        Self(PAGES_WITH_RECENT_POSTS.into())
    }

    pub fn feed() -> Self {
        Self(FEED.into())
    }

    /// Tag shared by every cached error page.
    pub fn error() -> Self {
        Self(ERROR.into())
    }

    /// Tag of the cached error page for one status code.
    pub fn error_code(status: u16) -> Self {
        Self(format!("{ERROR}:{status}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// Empty tags are degenerate: namespacing one yields the bare tenant prefix,
    /// which would purge the whole tenant.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Tag {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
