//! Extension points invoked while building purge output.
//!
//! Hooks are registered once at startup and run synchronously, in
//! registration order. A failing hook is logged and skipped; it never aborts
//! the purge or the response.

use std::fmt;
use std::sync::Arc;

use super::accumulator::PurgeAccumulator;
use super::request::CacheControl;
use crate::tag::Tag;

/// Error reported by an extension hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hook failed: {0}")]
pub struct HookError(pub String);

/// Tags a hook wants added to the pending purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookTags {
    pub public: Vec<Tag>,
    pub private: Vec<Tag>,
}

impl HookTags {
    pub fn public(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self { public: tags.into_iter().collect(), private: Vec::new() }
    }
}

/// A registered extension.
///
/// Every method has a no-op default so an implementation only overrides the
/// points it cares about.
pub trait PurgeHook: Send + Sync {
    fn name(&self) -> &str;

    /// Contribute tags right before the header is finalized.
    fn collect(&self) -> Result<HookTags, HookError> {
        Ok(HookTags::default())
    }

    /// Contribute tags when a post is about to be purged.
    fn on_post_purge(&self, _post_id: u64) -> Result<HookTags, HookError> {
        Ok(HookTags::default())
    }

    /// Rewrite response cache control.
    fn control(&self, control: CacheControl) -> Result<CacheControl, HookError> {
        Ok(control)
    }
}

/// Ordered list of registered hooks.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn PurgeHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn PurgeHook>) {
        tracing::debug!(hook = hook.name(), "registered purge hook");
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every `collect` hook and fold its tags into `acc`.
    pub fn collect_into(&self, acc: &mut PurgeAccumulator) {
        for hook in &self.hooks {
            match hook.collect() {
                Ok(tags) => apply(acc, tags),
                Err(e) => tracing::warn!(hook = hook.name(), error = %e, "collect hook failed, skipping"),
            }
        }
    }

    /// Run every `on_post_purge` hook and fold its tags into `acc`.
    pub fn post_purge_into(&self, acc: &mut PurgeAccumulator, post_id: u64) {
        for hook in &self.hooks {
            match hook.on_post_purge(post_id) {
                Ok(tags) => apply(acc, tags),
                Err(e) => tracing::warn!(hook = hook.name(), post_id, error = %e, "post purge hook failed, skipping"),
            }
        }
    }

    /// Thread `control` through every `control` hook.
    ///
    /// A failing hook leaves the value it received untouched.
    pub fn control(&self, control: CacheControl) -> CacheControl {
        self.hooks.iter().fold(control, |current, hook| match hook.control(current) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(hook = hook.name(), error = %e, "control hook failed, skipping");
                current
            }
        })
    }
}

fn apply(acc: &mut PurgeAccumulator, tags: HookTags) {
    acc.add_public(tags.public);
    acc.add_private(tags.private);
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hooks.iter().map(|h| h.name())).finish()
    }
}
