//! Site content operations.
//!
//! The content graph is owned by the site itself; this crate writes only
//! the post rows and term assignments reported with a post change. The
//! remaining writers seed fixtures and are gated behind `test-util`.

use chrono::NaiveDateTime;
use tokio_rusqlite::params;

use super::connection::SiteDb;
use crate::Error;
use crate::content::index::Term;
use crate::content::{Post, PostStatus, SiteIndex, WidgetKind};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A post row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: u64,
    pub status: PostStatus,
    pub post_type: String,
    pub author_id: u64,
    pub published_at: NaiveDateTime,
    pub permalink: Option<String>,
}

fn to_sql_id(id: u64) -> Result<i64, Error> {
    i64::try_from(id).map_err(|_| Error::InvalidInput(format!("id out of range: {id}")))
}

fn from_sql_id(raw: i64) -> Result<u64, Error> {
    u64::try_from(raw).map_err(|_| Error::CorruptRow(format!("negative id: {raw}")))
}

/// Parse a publish timestamp in the store's `YYYY-MM-DD HH:MM:SS` form.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if the value does not match that form.
pub fn parse_published_at(raw: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("published_at {raw}: {e}")))
}

type PostRow = (i64, String, String, i64, String, Option<String>);

fn post_from_row(row: PostRow) -> Result<(Post, Option<String>), Error> {
    let (id, status, post_type, author_id, published_at, permalink) = row;
    let status = status
        .parse::<PostStatus>()
        .map_err(|e| Error::CorruptRow(format!("post {id}: {e}")))?;
    let published_at = NaiveDateTime::parse_from_str(&published_at, DATETIME_FORMAT)
        .map_err(|e| Error::CorruptRow(format!("post {id}: published_at {published_at}: {e}")))?;
    let post = Post { id: from_sql_id(id)?, status, post_type, author_id: from_sql_id(author_id)?, published_at };
    Ok((post, permalink))
}

impl SiteDb {
    /// Insert or update a post.
    pub async fn upsert_post(&self, record: &PostRecord) -> Result<(), Error> {
        let id = to_sql_id(record.id)?;
        let author_id = to_sql_id(record.author_id)?;
        let status = record.status.as_str();
        let post_type = record.post_type.clone();
        let published_at = record.published_at.format(DATETIME_FORMAT).to_string();
        let permalink = record.permalink.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO posts (id, status, post_type, author_id, published_at, permalink)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET
                        status = excluded.status,
                        post_type = excluded.post_type,
                        author_id = excluded.author_id,
                        published_at = excluded.published_at,
                        permalink = excluded.permalink",
                    params![id, status, post_type, author_id, published_at, permalink],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Replace every term assignment of a post.
    pub async fn replace_post_terms(&self, post_id: u64, term_ids: &[u64]) -> Result<(), Error> {
        let post_id = to_sql_id(post_id)?;
        let term_ids = term_ids.iter().map(|&id| to_sql_id(id)).collect::<Result<Vec<_>, _>>()?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM term_relationships WHERE post_id = ?1", params![post_id])?;
                for term_id in &term_ids {
                    tx.execute(
                        "INSERT OR IGNORE INTO term_relationships (post_id, term_id) VALUES (?1, ?2)",
                        params![post_id, term_id],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Snapshot the whole content graph into a [`SiteIndex`].
    pub async fn load_index(&self) -> Result<SiteIndex, Error> {
        let index = self
            .conn
            .call(|conn| -> Result<SiteIndex, Error> {
                let mut index = SiteIndex::new();

                let mut stmt =
                    conn.prepare("SELECT id, status, post_type, author_id, published_at, permalink FROM posts")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                })?;
                for row in rows {
                    let (post, permalink) = post_from_row(row?)?;
                    index.insert_post(post, permalink);
                }

                let mut stmt = conn.prepare("SELECT post_type, taxonomy FROM taxonomies ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
                for row in rows {
                    let (post_type, taxonomy) = row?;
                    index.register_taxonomy(&post_type, &taxonomy);
                }

                let mut stmt = conn.prepare("SELECT id, taxonomy, slug FROM terms")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?;
                for row in rows {
                    let (id, taxonomy, slug) = row?;
                    index.insert_term(Term { id: from_sql_id(id)?, taxonomy, slug });
                }

                let mut stmt = conn.prepare("SELECT post_id, term_id FROM term_relationships ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
                for row in rows {
                    let (post_id, term_id) = row?;
                    index.assign_term(from_sql_id(post_id)?, from_sql_id(term_id)?);
                }

                let mut stmt = conn.prepare("SELECT post_type FROM post_type_archives")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                for row in rows {
                    index.enable_archive(&row?);
                }

                let mut stmt = conn.prepare("SELECT kind, widget_id FROM widgets")?;
                let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
                for row in rows {
                    let (kind, widget_id) = row?;
                    match kind.parse::<WidgetKind>() {
                        Ok(kind) => index.set_widget(kind, &widget_id),
                        Err(_) => tracing::warn!(kind = %kind, "ignoring unknown widget kind in site store"),
                    }
                }

                let mut stmt = conn.prepare("SELECT blog_id FROM tenants ORDER BY blog_id")?;
                let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
                for row in rows {
                    index.add_tenant(from_sql_id(row?)?);
                }

                Ok(index)
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(posts = index.post_count(), "loaded site index");

        Ok(index)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl SiteDb {
    /// Register a taxonomy against a content type.
    pub async fn register_taxonomy(&self, post_type: &str, taxonomy: &str) -> Result<(), Error> {
        let post_type = post_type.to_string();
        let taxonomy = taxonomy.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO taxonomies (post_type, taxonomy) VALUES (?1, ?2)",
                    params![post_type, taxonomy],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a term.
    pub async fn upsert_term(&self, id: u64, taxonomy: &str, slug: &str) -> Result<(), Error> {
        let id = to_sql_id(id)?;
        let taxonomy = taxonomy.to_string();
        let slug = slug.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO terms (id, taxonomy, slug) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET taxonomy = excluded.taxonomy, slug = excluded.slug",
                    params![id, taxonomy, slug],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Assign a term to a post.
    pub async fn assign_term(&self, post_id: u64, term_id: u64) -> Result<(), Error> {
        let post_id = to_sql_id(post_id)?;
        let term_id = to_sql_id(term_id)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO term_relationships (post_id, term_id) VALUES (?1, ?2)",
                    params![post_id, term_id],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Mark a content type as having a public archive.
    pub async fn enable_archive(&self, post_type: &str) -> Result<(), Error> {
        let post_type = post_type.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("INSERT OR IGNORE INTO post_type_archives (post_type) VALUES (?1)", params![post_type])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Record the active instance of a widget kind.
    pub async fn set_widget(&self, kind: WidgetKind, widget_id: &str) -> Result<(), Error> {
        let widget_id = widget_id.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO widgets (kind, widget_id) VALUES (?1, ?2)
                     ON CONFLICT(kind) DO UPDATE SET widget_id = excluded.widget_id",
                    params![kind.as_str(), widget_id],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Add a site to the network's tenant list.
    pub async fn add_tenant(&self, blog_id: u64, domain: Option<&str>) -> Result<(), Error> {
        let blog_id = to_sql_id(blog_id)?;
        let domain = domain.map(str::to_string);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO tenants (blog_id, domain) VALUES (?1, ?2)
                     ON CONFLICT(blog_id) DO UPDATE SET domain = excluded.domain",
                    params![blog_id, domain],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
