//! Tag-based purge engine.
//!
//! A request creates a [`PurgeAccumulator`], queues tags into it (directly,
//! through [`TagResolver`] for a changed post, or from a bulk list), and at
//! response time hands it to [`HeaderBuilder`] which finalizes it and emits
//! the purge header value. [`PurgeService`] bundles the pieces for one
//! tenant.

pub mod accumulator;
pub mod builder;
pub mod bulk;
pub mod deployment;
pub mod hooks;
pub mod request;
pub mod resolver;
pub mod service;

pub use accumulator::{ERROR_PAGE_CODES, PurgeAccumulator};
pub use builder::{HeaderBuilder, PURGE_HEADER_NAME};
pub use bulk::{BulkOutcome, Notice, NoticeLevel, PurgeListForm, PurgeSelector, purge_list};
pub use deployment::Deployment;
pub use hooks::{HookError, HookRegistry, HookTags, PurgeHook};
pub use request::{AdminScope, CacheControl, RequestContext};
pub use resolver::TagResolver;
pub use service::PurgeService;
