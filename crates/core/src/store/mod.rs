//! SQLite-backed site store.
//!
//! Holds the content graph (posts, taxonomies, terms, widgets) and the
//! tenant list of a network. The purge engine reads an in-memory
//! [`crate::SiteIndex`] snapshot of it; [`LiveSite`] keeps that snapshot
//! current while a server runs.

pub mod connection;
pub mod live;
pub mod migrations;
pub mod site;

pub use connection::SiteDb;
pub use live::LiveSite;
pub use site::{PostRecord, parse_published_at};
