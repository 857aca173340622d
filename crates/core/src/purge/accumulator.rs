//! Per-request purge accumulator.
//!
//! Collects the tags a request wants purged, separately for the shared
//! (public) and per-session (private) cache tiers. One accumulator lives for
//! exactly one request/response cycle and is never shared between requests.

use super::deployment::Deployment;
use crate::content::{ContentSource, WidgetKind};
use crate::tag::{Tag, dedup_in_place};

/// Error page status codes that can be purged individually.
pub const ERROR_PAGE_CODES: [u16; 3] = [403, 404, 500];

/// Pending purge tags and flags for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeAccumulator {
    public: Vec<Tag>,
    private: Vec<Tag>,
    purge_related: bool,
    purge_single: bool,
}

impl PurgeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue tags for the shared cache tier.
    pub fn add_public(&mut self, tags: impl IntoIterator<Item = Tag>) {
        self.public.extend(tags);
    }

    /// Queue tags for the per-session cache tier.
    pub fn add_private(&mut self, tags: impl IntoIterator<Item = Tag>) {
        self.private.extend(tags);
    }

    /// Also purge every tag the current response was rendered with.
    pub fn request_related_purge(&mut self) {
        self.purge_related = true;
    }

    /// Also purge the URL tag of the current request.
    pub fn request_single_purge(&mut self) {
        self.purge_single = true;
    }

    pub fn related_purge_requested(&self) -> bool {
        self.purge_related
    }

    pub fn single_purge_requested(&self) -> bool {
        self.purge_single
    }

    /// Whether a query-string style purge (related or single) is pending.
    pub fn has_pending_purge(&self) -> bool {
        self.purge_single || self.purge_related
    }

    pub fn public_tags(&self) -> &[Tag] {
        &self.public
    }

    pub fn private_tags(&self) -> &[Tag] {
        &self.private
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty()
    }

    /// Purge everything this tenant has cached.
    pub fn purge_all(&mut self, deployment: &Deployment) {
        tracing::info!("purge-all requested");
        self.public.push(Tag::wildcard());
        if deployment.has_private_tier() {
            self.private.push(Tag::wildcard());
        }
        deployment.reset_crawler();
    }

    pub fn purge_front(&mut self, deployment: &Deployment) {
        self.public.push(Tag::front_page());
        if deployment.has_private_tier() {
            self.private.push(Tag::front_page());
        }
    }

    pub fn purge_pages(&mut self) {
        self.public.push(Tag::pages());
    }

    /// Purge cached error pages, plus the page of every selected status code.
    pub fn purge_errors(&mut self, codes: &[u16]) {
        self.public.push(Tag::error());
        for code in codes {
            if ERROR_PAGE_CODES.contains(code) {
                self.public.push(Tag::error_code(*code));
            } else {
                tracing::debug!(code, "ignoring error page code without its own cache entry");
            }
        }
    }

    /// Purge one widget instance from both tiers.
    pub fn purge_widget(&mut self, widget_id: &str) {
        let tag = Tag::widget(widget_id);
        self.public.push(tag.clone());
        self.private.push(tag);
    }

    /// Purge the recent-comments widget after a comment count change.
    pub fn purge_comment_widget(&mut self, source: &dyn ContentSource) {
        if let Some(widget_id) = source.widget_instance(WidgetKind::RecentComments) {
            self.purge_widget(&widget_id);
        }
    }

    /// Purge feeds, if feeds are cached at all.
    pub fn purge_feeds(&mut self, feed_ttl: u64) {
        if feed_ttl > 0 {
            self.public.push(Tag::feed());
        }
    }

    /// Drop everything cached for the session that is logging out.
    pub fn purge_on_logout(&mut self) {
        self.private.push(Tag::wildcard());
    }

    /// Fold the request-derived tags in and deduplicate both tiers.
    ///
    /// `single` is the current request's URL tag, `related` the tags the
    /// response was rendered with. Empty related tags are dropped: once
    /// namespaced they would purge the entire tenant. Every append is
    /// followed by a dedup, so calling this again leaves the sets unchanged.
    pub(crate) fn finalize(&mut self, single: Option<Tag>, related: &[Tag]) {
        if let Some(tag) = single.filter(|_| self.purge_single) {
            self.public.push(tag);
        }

        if self.purge_related {
            self.public
                .extend(related.iter().filter(|tag| !tag.is_empty()).cloned());
        }

        dedup_in_place(&mut self.public);
        dedup_in_place(&mut self.private);
    }
}
