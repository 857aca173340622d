//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `tag_prefix` is empty or contains characters outside `[A-Za-z0-9_-]`
    /// - `blog_id` is 0
    /// - `site_url` is not an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "tag_prefix".into(), reason: "must not be empty".into() });
        }
        if !self.tag_prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ConfigError::Invalid {
                field: "tag_prefix".into(),
                reason: "must contain only ASCII letters, digits, '_' or '-'".into(),
            });
        }

        if self.blog_id == 0 {
            return Err(ConfigError::Invalid { field: "blog_id".into(), reason: "must be greater than 0".into() });
        }

        self.site_origin()?;

        if self.full_flush && self.multisite {
            tracing::warn!(
                blog_id = self.blog_id,
                "full_flush is set on a multisite deployment; \
                 purge-all on any site will empty every tenant"
            );
        }

        Ok(())
    }

    /// Path of the site store, for deferred validation by callers that need it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `db_path` is empty.
    pub fn require_db_path(&self) -> Result<&std::path::Path, ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "db_path".into(),
                hint: "Set TAGPURGE_DB_PATH environment variable".into(),
            });
        }
        Ok(&self.db_path)
    }
}
