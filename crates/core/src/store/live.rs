//! Store-backed site view for a long-running server.
//!
//! Tools read the content graph through a [`SiteIndex`] snapshot. A
//! [`LiveSite`] reloads that snapshot from the store before every lookup
//! that decides what to purge, so a post created or retagged after startup
//! is seen on the next call.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::connection::SiteDb;
use super::site::PostRecord;
use crate::Error;
use crate::content::{SiteIndex, TenantDirectory};

/// The site store plus its most recently loaded snapshot.
pub struct LiveSite {
    db: SiteDb,
    current: RwLock<Arc<SiteIndex>>,
}

impl LiveSite {
    /// Load the initial snapshot from `db`.
    pub async fn load(db: SiteDb) -> Result<Self, Error> {
        let index = db.load_index().await?;
        tracing::info!(posts = index.post_count(), "site index loaded");
        Ok(Self { db, current: RwLock::new(Arc::new(index)) })
    }

    pub fn db(&self) -> &SiteDb {
        &self.db
    }

    /// The last loaded snapshot, without touching the store.
    pub fn snapshot(&self) -> Arc<SiteIndex> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Reload the snapshot from the store and return it.
    pub async fn refresh(&self) -> Result<Arc<SiteIndex>, Error> {
        let index = Arc::new(self.db.load_index().await?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&index);
        Ok(index)
    }

    /// Write a changed post (and optionally its full term list), then reload.
    pub async fn record_post(&self, record: &PostRecord, term_ids: Option<&[u64]>) -> Result<Arc<SiteIndex>, Error> {
        self.db.upsert_post(record).await?;
        if let Some(term_ids) = term_ids {
            self.db.replace_post_terms(record.id, term_ids).await?;
        }
        tracing::debug!(post_id = record.id, status = %record.status, "recorded post change");
        self.refresh().await
    }
}

impl TenantDirectory for LiveSite {
    fn tenant_ids(&self) -> Result<Vec<u64>, Error> {
        self.snapshot().tenant_ids()
    }
}

impl fmt::Debug for LiveSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSite").field("posts", &self.snapshot().post_count()).finish()
    }
}
