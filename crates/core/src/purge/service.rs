//! Purge entry points shared by every request handler.

use std::sync::Arc;

use super::accumulator::PurgeAccumulator;
use super::builder::HeaderBuilder;
use super::bulk::{self, Notice, PurgeListForm};
use super::deployment::Deployment;
use super::hooks::HookRegistry;
use super::request::RequestContext;
use super::resolver::TagResolver;
use crate::config::{AppConfig, ConfigError};
use crate::content::{ContentSource, CrawlerControl, TenantDirectory};
use crate::tag::{SiteOrigin, TagSet};
use crate::Error;

/// Read-only purge engine for one tenant.
///
/// Built once from configuration and shared behind an `Arc`; each request
/// brings its own [`PurgeAccumulator`] and [`RequestContext`].
#[derive(Debug, Clone)]
pub struct PurgeService {
    resolver: TagResolver,
    builder: HeaderBuilder,
    deployment: Deployment,
    hooks: Arc<HookRegistry>,
    origin: SiteOrigin,
    feed_ttl: u64,
}

impl PurgeService {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configured site URL has no usable origin.
    pub fn new(
        config: &AppConfig, tenants: Arc<dyn TenantDirectory>, hooks: HookRegistry,
        crawler: Option<Arc<dyn CrawlerControl>>,
    ) -> Result<Self, ConfigError> {
        let origin = config.site_origin()?;
        let hooks = Arc::new(hooks);
        Ok(Self {
            resolver: TagResolver::from_config(config, origin.clone()),
            builder: HeaderBuilder::from_config(config, origin.clone(), Arc::clone(&hooks), tenants),
            deployment: Deployment::from_config(config, crawler),
            hooks,
            origin,
            feed_ttl: config.feed_ttl,
        })
    }

    pub fn resolver(&self) -> &TagResolver {
        &self.resolver
    }

    pub fn builder(&self) -> &HeaderBuilder {
        &self.builder
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn origin(&self) -> &SiteOrigin {
        &self.origin
    }

    pub fn feed_ttl(&self) -> u64 {
        self.feed_ttl
    }

    /// Queue the purge for a changed post.
    ///
    /// Posts whose status cannot affect cached pages are ignored and `None`
    /// is returned. Otherwise the resolved tags are queued and the response
    /// is marked stale. A wildcard turns into a purge-all, and post-purge
    /// hooks only run when it does not.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the post does not exist.
    pub fn purge_post(
        &self, acc: &mut PurgeAccumulator, request: &mut RequestContext, source: &dyn ContentSource, post_id: u64,
    ) -> Result<Option<TagSet>, Error> {
        let post = source.post(post_id).ok_or_else(|| Error::NotFound(format!("post {post_id}")))?;
        if !post.status.triggers_purge() {
            tracing::debug!(post_id, status = %post.status, "post status does not trigger a purge");
            return Ok(None);
        }

        let tags = self.resolver.resolve_for_post(source, post_id)?;
        if tags.contains_wildcard() {
            acc.purge_all(&self.deployment);
        } else {
            self.hooks.post_purge_into(acc, post_id);
            acc.add_public(tags.iter().cloned());
        }
        request.control.set_stale();

        tracing::info!(post_id, tags = tags.len(), "queued post purge");
        Ok(Some(tags))
    }

    /// Queue the tags of a bulk purge list and return its notices.
    ///
    /// # Errors
    ///
    /// See [`bulk::purge_list`].
    pub fn purge_list(
        &self, acc: &mut PurgeAccumulator, source: &dyn ContentSource, form: &PurgeListForm,
    ) -> Result<Vec<Notice>, Error> {
        let outcome = bulk::purge_list(source, &self.origin, form)?;
        acc.add_public(outcome.tags);
        Ok(outcome.notices)
    }

    /// Finalize the accumulator and produce the purge header value.
    pub fn output(&self, acc: &mut PurgeAccumulator, request: &mut RequestContext) -> String {
        self.builder.finalize_and_serialize(acc, request)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;
    use crate::content::{Post, PostStatus, SiteIndex};
    use crate::policy::{PurgeCategory, PurgePolicy};
    use crate::purge::hooks::{HookError, HookTags, PurgeHook};
    use crate::tag::Tag;

    fn site() -> Arc<SiteIndex> {
        let mut index = SiteIndex::new();
        let published_at = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(12, 0, 0).unwrap();
        for (id, status) in [(5, PostStatus::Publish), (6, PostStatus::Pending)] {
            index.insert_post(Post { id, status, post_type: "page".into(), author_id: 2, published_at }, None);
        }
        index.add_tenant(1);
        Arc::new(index)
    }

    fn service(config: &AppConfig, hooks: HookRegistry) -> PurgeService {
        PurgeService::new(config, site(), hooks, None).unwrap()
    }

    fn config(categories: &[PurgeCategory]) -> AppConfig {
        AppConfig { purge_by_post: PurgePolicy::new(categories.iter().copied()), ..Default::default() }
    }

    struct Related;

    impl PurgeHook for Related {
        fn name(&self) -> &str {
            "related"
        }

        fn on_post_purge(&self, post_id: u64) -> Result<HookTags, HookError> {
            Ok(HookTags::public([Tag::from(format!("shop:{post_id}"))]))
        }
    }

    #[test]
    fn test_purge_post_marks_stale() {
        let index = site();
        let service = service(&config(&[PurgeCategory::Author]), HookRegistry::new());
        let mut acc = PurgeAccumulator::new();
        let mut request = RequestContext::new("/wp-admin/post.php");

        let tags = service.purge_post(&mut acc, &mut request, index.as_ref(), 5).unwrap().unwrap();
        assert_eq!(tags.as_slice(), &[Tag::post(5), Tag::author(2)]);
        assert_eq!(service.output(&mut acc, &mut request), "public,stale,tag=lsc1_post:5,lsc1_author:2");
    }

    #[test]
    fn test_purge_post_ignores_pending() {
        let index = site();
        let service = service(&AppConfig::default(), HookRegistry::new());
        let mut acc = PurgeAccumulator::new();
        let mut request = RequestContext::new("/");

        assert!(service.purge_post(&mut acc, &mut request, index.as_ref(), 6).unwrap().is_none());
        assert!(acc.is_empty());
        assert!(!request.control.is_stale());
    }

    #[test]
    fn test_purge_post_missing() {
        let index = site();
        let service = service(&AppConfig::default(), HookRegistry::new());
        let err = service
            .purge_post(&mut PurgeAccumulator::new(), &mut RequestContext::new("/"), index.as_ref(), 404)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_purge_post_wildcard_becomes_purge_all() {
        let index = site();
        let service = service(&config(&[PurgeCategory::AllPages]), HookRegistry::new());
        let mut acc = PurgeAccumulator::new();
        let mut request = RequestContext::new("/");

        service.purge_post(&mut acc, &mut request, index.as_ref(), 5).unwrap();
        assert_eq!(acc.private_tags(), &[Tag::wildcard()]);
        assert_eq!(service.output(&mut acc, &mut request), "public,stale,tag=lsc1_;private,*");
    }

    #[test]
    fn test_post_purge_hooks_contribute() {
        let index = site();
        let mut hooks = HookRegistry::new();
        hooks.register(Arc::new(Related));
        let service = service(&config(&[]), hooks);
        let mut acc = PurgeAccumulator::new();
        let mut request = RequestContext::new("/");

        service.purge_post(&mut acc, &mut request, index.as_ref(), 5).unwrap();
        assert_eq!(acc.public_tags(), &[Tag::from("shop:5"), Tag::post(5)]);
    }

    #[test]
    fn test_post_purge_hooks_skipped_for_purge_all() {
        let index = site();
        let mut hooks = HookRegistry::new();
        hooks.register(Arc::new(Related));
        let service = service(&config(&[PurgeCategory::AllPages]), hooks);
        let mut acc = PurgeAccumulator::new();
        let mut request = RequestContext::new("/");

        service.purge_post(&mut acc, &mut request, index.as_ref(), 5).unwrap();
        assert_eq!(acc.public_tags(), &[Tag::wildcard()]);
    }

    #[derive(Default)]
    struct CountingCrawler(AtomicUsize);

    impl CrawlerControl for CountingCrawler {
        fn reset_position(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_purge_all_resets_active_crawler() {
        let index = site();
        let crawler = Arc::new(CountingCrawler::default());
        let config = AppConfig {
            crawler_cron_active: true,
            purge_by_post: PurgePolicy::new([PurgeCategory::AllPages]),
            ..Default::default()
        };
        let service = PurgeService::new(&config, index.clone(), HookRegistry::new(), Some(crawler.clone())).unwrap();

        PurgeAccumulator::new().purge_all(service.deployment());
        assert_eq!(crawler.0.load(Ordering::SeqCst), 1);

        service
            .purge_post(&mut PurgeAccumulator::new(), &mut RequestContext::new("/"), index.as_ref(), 5)
            .unwrap();
        assert_eq!(crawler.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_crawler_untouched_without_cron() {
        let crawler = Arc::new(CountingCrawler::default());
        let service = PurgeService::new(&AppConfig::default(), site(), HookRegistry::new(), Some(crawler.clone())).unwrap();
        PurgeAccumulator::new().purge_all(service.deployment());
        assert_eq!(crawler.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_purge_list_queues_tags() {
        let index = site();
        let service = service(&AppConfig::default(), HookRegistry::new());
        let mut acc = PurgeAccumulator::new();
        let form = PurgeListForm { select: Some("post_id".into()), list: Some("5,6".into()) };

        let notices = service.purge_list(&mut acc, index.as_ref(), &form).unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(acc.public_tags(), &[Tag::post(5)]);
    }

    #[test]
    fn test_invalid_site_url_rejected() {
        let config = AppConfig { site_url: "not a url".into(), ..Default::default() };
        assert!(PurgeService::new(&config, site(), HookRegistry::new(), None).is_err());
    }
}
