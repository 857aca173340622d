//! In-memory site index.
//!
//! A read-only snapshot of the content graph, built by
//! [`crate::store::SiteDb::load_index`] and shared across request handlers
//! behind an `Arc`.

use std::collections::{HashMap, HashSet};

use super::{Adjacent, ContentSource, Post, PostStatus, TenantDirectory, WidgetKind};
use crate::Error;

/// A taxonomy term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub id: u64,
    pub taxonomy: String,
    pub slug: String,
}

/// Snapshot of posts, terms, widgets and tenants.
#[derive(Debug, Clone, Default)]
pub struct SiteIndex {
    posts: HashMap<u64, Post>,
    permalinks: HashMap<u64, String>,
    taxonomies: HashMap<String, Vec<String>>,
    terms: HashMap<u64, Term>,
    assignments: HashMap<u64, Vec<u64>>,
    archives: HashSet<String>,
    widgets: HashMap<WidgetKind, String>,
    tenants: Vec<u64>,
}

impl SiteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&mut self, post: Post, permalink: Option<String>) {
        if let Some(link) = permalink {
            self.permalinks.insert(post.id, link);
        }
        self.posts.insert(post.id, post);
    }

    pub fn register_taxonomy(&mut self, post_type: &str, taxonomy: &str) {
        let registered = self.taxonomies.entry(post_type.to_string()).or_default();
        if !registered.iter().any(|t| t == taxonomy) {
            registered.push(taxonomy.to_string());
        }
    }

    pub fn insert_term(&mut self, term: Term) {
        self.terms.insert(term.id, term);
    }

    pub fn assign_term(&mut self, post_id: u64, term_id: u64) {
        let assigned = self.assignments.entry(post_id).or_default();
        if !assigned.contains(&term_id) {
            assigned.push(term_id);
        }
    }

    pub fn enable_archive(&mut self, post_type: &str) {
        self.archives.insert(post_type.to_string());
    }

    pub fn set_widget(&mut self, kind: WidgetKind, widget_id: &str) {
        self.widgets.insert(kind, widget_id.to_string());
    }

    pub fn add_tenant(&mut self, blog_id: u64) {
        if !self.tenants.contains(&blog_id) {
            self.tenants.push(blog_id);
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

impl ContentSource for SiteIndex {
    fn post(&self, id: u64) -> Option<Post> {
        self.posts.get(&id).cloned()
    }

    fn permalink(&self, id: u64) -> Option<String> {
        self.permalinks.get(&id).cloned()
    }

    /// Ordering is by publish time, ties broken by id, among published posts
    /// of the same content type.
    fn adjacent_posts(&self, id: u64) -> Adjacent {
        let Some(current) = self.posts.get(&id) else {
            return Adjacent::default();
        };
        let key = (current.published_at, current.id);

        let siblings = self
            .posts
            .values()
            .filter(|p| p.id != id && p.status == PostStatus::Publish && p.post_type == current.post_type);

        let mut adjacent = Adjacent::default();
        let mut prev_key = None;
        let mut next_key = None;
        for post in siblings {
            let candidate = (post.published_at, post.id);
            if candidate < key && prev_key.is_none_or(|best| candidate > best) {
                prev_key = Some(candidate);
                adjacent.previous = Some(post.id);
            } else if candidate > key && next_key.is_none_or(|best| candidate < best) {
                next_key = Some(candidate);
                adjacent.next = Some(post.id);
            }
        }
        adjacent
    }

    fn taxonomies_for(&self, post_type: &str) -> Vec<String> {
        self.taxonomies.get(post_type).cloned().unwrap_or_default()
    }

    fn terms_for(&self, post_id: u64, taxonomy: &str) -> Vec<u64> {
        self.assignments
            .get(&post_id)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| self.terms.get(id).is_some_and(|t| t.taxonomy == taxonomy))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn has_archive(&self, post_type: &str) -> bool {
        self.archives.contains(post_type)
    }

    fn widget_instance(&self, kind: WidgetKind) -> Option<String> {
        self.widgets.get(&kind).cloned()
    }

    fn term_by_slug(&self, taxonomy: &str, slug: &str) -> Option<u64> {
        self.terms
            .values()
            .find(|t| t.taxonomy == taxonomy && t.slug == slug)
            .map(|t| t.id)
    }
}

impl TenantDirectory for SiteIndex {
    fn tenant_ids(&self) -> Result<Vec<u64>, Error> {
        if self.tenants.is_empty() {
            return Err(Error::TenantListUnavailable);
        }
        Ok(self.tenants.clone())
    }
}
