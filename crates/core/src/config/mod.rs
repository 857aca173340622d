//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TAGPURGE_*)
//! 2. TOML config file (if TAGPURGE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::policy::PurgePolicy;
use crate::tag::SiteOrigin;

mod validation;

pub use validation::ConfigError;

/// Web server flavour in front of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerVariant {
    /// Full server with a private (per-session) cache tier.
    #[default]
    Litespeed,
    /// Open-source server; shared cache only.
    OpenLitespeed,
}

impl ServerVariant {
    /// Whether purging the private tier means anything on this server.
    pub fn has_private_tier(self) -> bool {
        matches!(self, ServerVariant::Litespeed)
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TAGPURGE_*)
/// 2. TOML config file (if TAGPURGE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global namespace prefix placed in front of every emitted tag.
    ///
    /// Set via TAGPURGE_TAG_PREFIX environment variable.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Public URL of the site; its origin is stripped from purge URLs.
    ///
    /// Set via TAGPURGE_SITE_URL environment variable.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Tenant id of the site this process serves.
    ///
    /// Set via TAGPURGE_BLOG_ID environment variable.
    #[serde(default = "default_blog_id")]
    pub blog_id: u64,

    /// Whether this is one site of a multi-tenant network.
    ///
    /// Set via TAGPURGE_MULTISITE environment variable.
    #[serde(default)]
    pub multisite: bool,

    /// Set via TAGPURGE_SERVER_VARIANT environment variable.
    #[serde(default)]
    pub server_variant: ServerVariant,

    /// Purge-all empties the whole store instead of one tenant namespace.
    ///
    /// Set via TAGPURGE_FULL_FLUSH environment variable.
    #[serde(default)]
    pub full_flush: bool,

    /// Categories a post change fans out to.
    ///
    /// Set via TAGPURGE_PURGE_BY_POST environment variable, either as a
    /// dot-joined code string (`F.H.T`) or a list of category names.
    #[serde(default = "PurgePolicy::precise")]
    pub purge_by_post: PurgePolicy,

    /// Feed cache TTL in seconds; 0 means feeds are not cached.
    ///
    /// Set via TAGPURGE_FEED_TTL environment variable.
    #[serde(default)]
    pub feed_ttl: u64,

    /// Whether the background crawler runs on a schedule.
    ///
    /// Set via TAGPURGE_CRAWLER_CRON_ACTIVE environment variable.
    #[serde(default)]
    pub crawler_cron_active: bool,

    /// Path to the SQLite site store.
    ///
    /// Set via TAGPURGE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_tag_prefix() -> String {
    "lsc".into()
}

fn default_site_url() -> String {
    "http://localhost".into()
}

fn default_blog_id() -> u64 {
    1
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tagpurge-site.sqlite")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tag_prefix: default_tag_prefix(),
            site_url: default_site_url(),
            blog_id: default_blog_id(),
            multisite: false,
            server_variant: ServerVariant::default(),
            full_flush: false,
            purge_by_post: PurgePolicy::precise(),
            feed_ttl: 0,
            crawler_cron_active: false,
            db_path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TAGPURGE_`
    /// 2. TOML file from `TAGPURGE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TAGPURGE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TAGPURGE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Origin of the configured site URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `site_url` is not an absolute http(s) URL.
    pub fn site_origin(&self) -> Result<SiteOrigin, ConfigError> {
        SiteOrigin::parse(&self.site_url)
            .map_err(|e| ConfigError::Invalid { field: "site_url".into(), reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PurgeCategory;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tag_prefix, "lsc");
        assert_eq!(config.site_url, "http://localhost");
        assert_eq!(config.blog_id, 1);
        assert!(!config.multisite);
        assert_eq!(config.server_variant, ServerVariant::Litespeed);
        assert!(!config.full_flush);
        assert_eq!(config.purge_by_post, PurgePolicy::precise());
        assert_eq!(config.feed_ttl, 0);
        assert!(!config.crawler_cron_active);
        assert_eq!(config.db_path, PathBuf::from("./tagpurge-site.sqlite"));
    }

    #[test]
    fn test_private_tier_by_variant() {
        assert!(ServerVariant::Litespeed.has_private_tier());
        assert!(!ServerVariant::OpenLitespeed.has_private_tier());
    }

    #[test]
    fn test_site_origin() {
        let config = AppConfig { site_url: "https://example.com/blog".into(), ..Default::default() };
        assert_eq!(config.site_origin().unwrap().as_str(), "https://example.com");
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tagpurge.toml",
                r#"
                    tag_prefix = "filep"
                    blog_id = 3
                    purge_by_post = ["term", "author"]
                "#,
            )?;
            jail.set_env("TAGPURGE_CONFIG_FILE", "tagpurge.toml");
            jail.set_env("TAGPURGE_TAG_PREFIX", "envp");
            jail.set_env("TAGPURGE_SERVER_VARIANT", "open_litespeed");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.tag_prefix, "envp");
            assert_eq!(config.blog_id, 3);
            assert_eq!(config.server_variant, ServerVariant::OpenLitespeed);
            assert!(config.purge_by_post.purge_by_post(PurgeCategory::Author));
            assert!(!config.purge_by_post.purge_by_post(PurgeCategory::Year));
            Ok(())
        });
    }

    #[test]
    fn test_load_dotted_policy_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TAGPURGE_PURGE_BY_POST", "F.T.PT");

            let config = AppConfig::load().expect("config should load");
            assert!(config.purge_by_post.purge_by_post(PurgeCategory::FrontPage));
            assert!(config.purge_by_post.purge_by_post(PurgeCategory::PostType));
            assert!(!config.purge_by_post.purge_by_post(PurgeCategory::HomePage));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TAGPURGE_BLOG_ID", "0");

            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "blog_id"));
            Ok(())
        });
    }
}
