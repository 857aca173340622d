//! Post-change tag derivation.
//!
//! Maps a changed post to every tag whose cached pages may show it. Each
//! enabled category contributes independently, so enabling more categories
//! only ever widens the result.

use crate::config::AppConfig;
use crate::content::{ContentSource, DEFAULT_POST_TYPE, WidgetKind};
use crate::policy::{PurgeCategory, PurgePolicy};
use crate::tag::{DateGranularity, SiteOrigin, Tag, TagSet, url_tag};
use crate::Error;

/// Static page tags paired with the category that enables each.
const STATIC_PAGE_TAGS: [(PurgeCategory, fn() -> Tag); 4] = [
    (PurgeCategory::FrontPage, Tag::front_page),
    (PurgeCategory::HomePage, Tag::home),
    (PurgeCategory::Pages, Tag::pages),
    (PurgeCategory::PagesWithRecentPosts, Tag::pages_with_recent_posts),
];

const DATE_TAGS: [(PurgeCategory, DateGranularity); 3] = [
    (PurgeCategory::Date, DateGranularity::Day),
    (PurgeCategory::Month, DateGranularity::Month),
    (PurgeCategory::Year, DateGranularity::Year),
];

/// Derives the tags affected by a post change.
#[derive(Debug, Clone)]
pub struct TagResolver {
    policy: PurgePolicy,
    feed_ttl: u64,
    origin: SiteOrigin,
}

impl TagResolver {
    pub fn new(policy: PurgePolicy, feed_ttl: u64, origin: SiteOrigin) -> Self {
        Self { policy, feed_ttl, origin }
    }

    pub fn from_config(config: &AppConfig, origin: SiteOrigin) -> Self {
        Self::new(config.purge_by_post.clone(), config.feed_ttl, origin)
    }

    /// Every tag affected by a change to `post_id`.
    ///
    /// With `AllPages` enabled the result is exactly `{*}` and nothing is
    /// looked up. Callers filter on post status before calling.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the post does not exist.
    pub fn resolve_for_post(&self, source: &dyn ContentSource, post_id: u64) -> Result<TagSet, Error> {
        let mut tags = TagSet::new();

        if self.policy.purge_by_post(PurgeCategory::AllPages) {
            tags.insert(Tag::wildcard());
            return Ok(tags);
        }

        let post = source.post(post_id).ok_or_else(|| Error::NotFound(format!("post {post_id}")))?;

        tags.insert(Tag::post(post_id));
        if let Some(permalink) = source.permalink(post_id) {
            match url_tag(&self.origin, &permalink) {
                Ok(tag) => {
                    tags.insert(tag);
                }
                Err(e) => tracing::debug!(post_id, error = %e, "skipping permalink url tag"),
            }
        }

        if let Some(widget_id) = source.widget_instance(WidgetKind::RecentPosts) {
            tags.insert(Tag::widget(&widget_id));
        }

        if post.post_type == DEFAULT_POST_TYPE {
            let adjacent = source.adjacent_posts(post_id);
            tags.extend(adjacent.previous.into_iter().chain(adjacent.next).map(Tag::post));
        }

        if self.policy.purge_by_post(PurgeCategory::Term) {
            for taxonomy in source.taxonomies_for(&post.post_type) {
                tags.extend(source.terms_for(post_id, &taxonomy).into_iter().map(Tag::term));
            }
        }

        if self.feed_ttl > 0 {
            tags.insert(Tag::feed());
        }

        if self.policy.purge_by_post(PurgeCategory::Author) {
            tags.insert(Tag::author(post.author_id));
        }

        if self.policy.purge_by_post(PurgeCategory::PostType) && source.has_archive(&post.post_type) {
            tags.insert(Tag::post_type_archive(&post.post_type));
        }

        for (category, tag) in STATIC_PAGE_TAGS {
            if self.policy.purge_by_post(category) {
                tags.insert(tag());
            }
        }

        let published = post.published_at.date();
        for (category, granularity) in DATE_TAGS {
            if self.policy.purge_by_post(category) {
                tags.insert(Tag::date(published, granularity));
            }
        }

        tracing::debug!(post_id, count = tags.len(), "resolved post tags");
        Ok(tags)
    }
}
