//! Purge header serialization.
//!
//! Turns a finalized accumulator into the value of the purge response
//! header. Every tag is namespaced per tenant; the wildcard is rewritten
//! according to the deployment (whole store, every tenant, or one tenant).

use std::sync::Arc;

use super::accumulator::PurgeAccumulator;
use super::hooks::HookRegistry;
use super::request::{AdminScope, RequestContext};
use crate::config::AppConfig;
use crate::content::TenantDirectory;
use crate::tag::{SiteOrigin, Tag, url_tag};
use crate::Error;

/// Response header that carries purge directives to the cache.
pub const PURGE_HEADER_NAME: &str = "X-LiteSpeed-Purge";

const WILDCARD: &str = "*";

/// Builds purge header values for one tenant.
#[derive(Clone)]
pub struct HeaderBuilder {
    prefix: String,
    blog_id: u64,
    multisite: bool,
    full_flush: bool,
    origin: SiteOrigin,
    hooks: Arc<HookRegistry>,
    tenants: Arc<dyn TenantDirectory>,
}

impl HeaderBuilder {
    pub fn from_config(
        config: &AppConfig, origin: SiteOrigin, hooks: Arc<HookRegistry>, tenants: Arc<dyn TenantDirectory>,
    ) -> Self {
        Self {
            prefix: config.tag_prefix.clone(),
            blog_id: config.blog_id,
            multisite: config.multisite,
            full_flush: config.full_flush,
            origin,
            hooks,
            tenants,
        }
    }

    /// Namespace prefix of one tenant, e.g. `lsc1_`.
    pub fn tenant_prefix(&self, blog_id: u64) -> String {
        format!("{}{}_", self.prefix, blog_id)
    }

    /// Run the extension hooks and fold the request-derived tags in.
    ///
    /// Safe to call more than once: the tag sets do not grow on repeat calls.
    pub fn finalize(&self, acc: &mut PurgeAccumulator, request: &mut RequestContext) {
        self.hooks.collect_into(acc);
        request.control = self.hooks.control(request.control);

        let single = if acc.single_purge_requested() {
            match url_tag(&self.origin, &request.request_uri) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    tracing::warn!(uri = %request.request_uri, error = %e, "cannot derive url tag for single purge");
                    None
                }
            }
        } else {
            None
        };

        acc.finalize(single, &request.rendered_tags);
    }

    /// Finalize `acc` and serialize it into a header value.
    ///
    /// An empty string means no header should be sent.
    pub fn finalize_and_serialize(&self, acc: &mut PurgeAccumulator, request: &mut RequestContext) -> String {
        self.finalize(acc, request);

        if acc.is_empty() {
            return String::new();
        }

        let mut header = String::new();

        if !acc.public_tags().is_empty() {
            let built = match self.build(acc.public_tags(), request.admin_scope) {
                Ok(built) => built,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping purge header");
                    return String::new();
                }
            };
            if built.is_empty() {
                return String::new();
            }

            header.push_str("public,");
            if request.control.is_stale() {
                header.push_str("stale,");
            }
            header.push_str("tag=");
            header.push_str(&built.join(","));
        }

        let private = acc.private_tags();
        if !private.is_empty() {
            if !header.is_empty() {
                header.push(';');
            }
            header.push_str("private,");
            if private.iter().any(Tag::is_wildcard) {
                header.push_str(WILDCARD);
            } else {
                header.push_str("tag=");
                header.push_str(&self.namespaced(private, self.blog_id).join(","));
            }
        }

        tracing::info!(header = %header, "emitting purge header");
        header
    }

    /// Namespace a tag list for the current tenant.
    ///
    /// Without a wildcard every tag is prefixed. With one, the result is the
    /// literal `*` under full flush, one bare prefix per tenant for a network
    /// admin on a multisite deployment, and the current tenant's bare prefix
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::TenantListUnavailable` when the network path cannot
    /// enumerate tenants.
    pub fn build(&self, tags: &[Tag], scope: AdminScope) -> Result<Vec<String>, Error> {
        if !tags.iter().any(Tag::is_wildcard) {
            return Ok(self.namespaced(tags, self.blog_id));
        }

        if self.full_flush {
            return Ok(vec![WILDCARD.to_string()]);
        }

        if self.multisite && scope == AdminScope::Network {
            let tenants = self.tenants.tenant_ids()?;
            if tenants.is_empty() {
                return Err(Error::TenantListUnavailable);
            }
            tracing::info!(tenants = tenants.len(), "purging every tenant namespace");
            return Ok(tenants.into_iter().map(|id| self.tenant_prefix(id)).collect());
        }

        Ok(vec![self.tenant_prefix(self.blog_id)])
    }

    fn namespaced(&self, tags: &[Tag], blog_id: u64) -> Vec<String> {
        let prefix = self.tenant_prefix(blog_id);
        tags.iter().map(|tag| format!("{prefix}{tag}")).collect()
    }
}

impl std::fmt::Debug for HeaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderBuilder")
            .field("prefix", &self.prefix)
            .field("blog_id", &self.blog_id)
            .field("multisite", &self.multisite)
            .field("full_flush", &self.full_flush)
            .field("origin", &self.origin)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
