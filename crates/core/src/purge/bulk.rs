//! Bulk purge-by-list.
//!
//! An administrator submits a selector and a list of entries, one per line
//! or comma separated. Each entry becomes at most one tag. A bad entry is
//! reported and skipped; only a malformed form aborts the batch.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::content::{CATEGORY_TAXONOMY, ContentSource, PostStatus, TAG_TAXONOMY};
use crate::tag::{SiteOrigin, Tag, url_tag};
use crate::Error;

static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("slug pattern compiles"));

/// Raw bulk purge submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PurgeListForm {
    /// What the list entries are: `category`, `post_id`, `tag` or `url`.
    pub select: Option<String>,
    /// Entries separated by newlines or commas.
    pub list: Option<String>,
}

/// Kind of entry in a purge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeSelector {
    Category,
    PostId,
    Tag,
    Url,
}

impl FromStr for PurgeSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "category" => Ok(PurgeSelector::Category),
            "post_id" | "post-id" | "postid" => Ok(PurgeSelector::PostId),
            "tag" => Ok(PurgeSelector::Tag),
            "url" => Ok(PurgeSelector::Url),
            other => Err(Error::MalformedForm(format!("unknown selector: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible message about one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: String) -> Self {
        Self { level: NoticeLevel::Success, message }
    }

    fn error(message: String) -> Self {
        Self { level: NoticeLevel::Error, message }
    }
}

/// Tags accepted from a list, plus a notice for every entry in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub tags: Vec<Tag>,
    pub notices: Vec<Notice>,
}

/// Validate a purge list and convert each accepted entry into a tag.
///
/// # Errors
///
/// Returns `Error::MalformedForm` when `select` or `list` is missing or the
/// selector is unknown, and `Error::EmptyInput` when the list is blank.
pub fn purge_list(source: &dyn ContentSource, origin: &SiteOrigin, form: &PurgeListForm) -> Result<BulkOutcome, Error> {
    let (Some(select), Some(list)) = (form.select.as_deref(), form.list.as_deref()) else {
        return Err(Error::MalformedForm("both select and list are required".into()));
    };

    if list.trim().is_empty() {
        return Err(Error::EmptyInput);
    }

    let selector: PurgeSelector = select.parse()?;

    let mut outcome = BulkOutcome::default();
    for entry in list.split([',', '\n', '\r']).map(str::trim).filter(|e| !e.is_empty()) {
        match validate_entry(source, origin, selector, entry) {
            Ok(tag) => {
                outcome.notices.push(Notice::success(format!("Purge {} {entry}", selector_label(selector))));
                outcome.tags.push(tag);
            }
            Err(e) if !e.is_per_item() => return Err(e),
            Err(e) => {
                tracing::warn!(entry, error = %e, "rejected purge list entry");
                outcome.notices.push(Notice::error(e.to_string()));
            }
        }
    }

    Ok(outcome)
}

/// Convert one list entry into its tag.
///
/// # Errors
///
/// Returns `InvalidIdentifier` for a malformed slug or post id, `NotFound`
/// for an entity that does not exist (or a post that is not published), and
/// `InvalidUrl` for a URL that cannot be tagged.
pub fn validate_entry(
    source: &dyn ContentSource, origin: &SiteOrigin, selector: PurgeSelector, entry: &str,
) -> Result<Tag, Error> {
    match selector {
        PurgeSelector::Category => term_entry(source, CATEGORY_TAXONOMY, "category", entry),
        PurgeSelector::Tag => term_entry(source, TAG_TAXONOMY, "tag", entry),
        PurgeSelector::PostId => {
            if !entry.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidIdentifier(format!("post id {entry}")));
            }
            let id: u64 = entry.parse().map_err(|_| Error::InvalidIdentifier(format!("post id {entry}")))?;
            match source.post(id) {
                Some(post) if post.status == PostStatus::Publish => Ok(Tag::post(id)),
                _ => Err(Error::NotFound(format!("published post {id}"))),
            }
        }
        PurgeSelector::Url => url_tag(origin, entry),
    }
}

fn term_entry(source: &dyn ContentSource, taxonomy: &str, label: &str, slug: &str) -> Result<Tag, Error> {
    if !SLUG.is_match(slug) {
        return Err(Error::InvalidIdentifier(format!("{label} {slug}")));
    }
    source
        .term_by_slug(taxonomy, slug)
        .map(Tag::term)
        .ok_or_else(|| Error::NotFound(format!("{label} {slug}")))
}

fn selector_label(selector: PurgeSelector) -> &'static str {
    match selector {
        PurgeSelector::Category => "category",
        PurgeSelector::PostId => "post",
        PurgeSelector::Tag => "tag",
        PurgeSelector::Url => "url",
    }
}
