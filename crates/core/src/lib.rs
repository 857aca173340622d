//! Core types and shared functionality for tagpurge.
//!
//! This crate provides:
//! - Tag namespace and the tag-based purge engine
//! - Content, tenant and crawler collaborator traits
//! - SQLite-backed site store feeding an in-memory site index
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod content;
pub mod error;
pub mod policy;
pub mod purge;
pub mod store;
pub mod tag;

pub use config::{AppConfig, ConfigError, ServerVariant};
pub use content::{ContentSource, CrawlerControl, SiteIndex, TenantDirectory};
pub use error::Error;
pub use policy::{PurgeCategory, PurgePolicy};
pub use purge::{AdminScope, PURGE_HEADER_NAME, PurgeAccumulator, PurgeService, RequestContext};
pub use store::{LiveSite, PostRecord, SiteDb};
pub use tag::{Tag, TagSet};
