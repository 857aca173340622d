//! Deployment capabilities that change what a purge means.

use std::fmt;
use std::sync::Arc;

use crate::config::{AppConfig, ServerVariant};
use crate::content::CrawlerControl;

/// Server capabilities plus the optional crawler to reset on purge-all.
#[derive(Clone, Default)]
pub struct Deployment {
    pub server_variant: ServerVariant,
    crawler: Option<Arc<dyn CrawlerControl>>,
}

impl Deployment {
    pub fn new(server_variant: ServerVariant) -> Self {
        Self { server_variant, crawler: None }
    }

    /// Build from configuration. The crawler is only kept when scheduled
    /// crawling is active.
    pub fn from_config(config: &AppConfig, crawler: Option<Arc<dyn CrawlerControl>>) -> Self {
        let crawler = if config.crawler_cron_active {
            if crawler.is_none() {
                tracing::warn!("crawler_cron_active is set but no crawler is attached");
            }
            crawler
        } else {
            None
        };
        Self { server_variant: config.server_variant, crawler }
    }

    pub fn has_private_tier(&self) -> bool {
        self.server_variant.has_private_tier()
    }

    pub(crate) fn reset_crawler(&self) {
        if let Some(crawler) = &self.crawler {
            tracing::debug!("resetting crawler position after purge-all");
            crawler.reset_position();
        }
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("server_variant", &self.server_variant)
            .field("crawler", &self.crawler.is_some())
            .finish()
    }
}
