//! Unified error types for tagpurge.
//!
//! Per-item failures (`InvalidUrl`, `InvalidIdentifier`, `NotFound`) are
//! recovered by the caller; structural failures abort the whole operation.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the purge engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters that are not covered by a more specific variant.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be turned into a url-hash tag.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Admin-entered slug or post id failed pattern validation.
    #[error("INVALID_IDENTIFIER: {0}")]
    InvalidIdentifier(String),

    /// Admin-entered slug or post id does not resolve to an entity.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Bulk purge request carried an empty list.
    #[error("EMPTY_INPUT")]
    EmptyInput,

    /// Bulk purge request is missing required fields or names an unknown selector.
    #[error("MALFORMED_FORM: {0}")]
    MalformedForm(String),

    /// Multi-tenant purge-all could not enumerate tenants.
    #[error("TENANT_LIST_UNAVAILABLE")]
    TenantListUnavailable,

    /// Site store operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Site store migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Site store row could not be mapped to a domain value.
    #[error("STORE_ERROR: corrupt row: {0}")]
    CorruptRow(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// Whether this error only invalidates a single bulk entry.
    pub fn is_per_item(&self) -> bool {
        matches!(self, Error::InvalidUrl(_) | Error::InvalidIdentifier(_) | Error::NotFound(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::InvalidIdentifier(msg) => (-32004, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::EmptyInput => (-32005, "Purge list is empty".to_string()),
            Error::MalformedForm(msg) => (-32006, msg.clone()),
            Error::TenantListUnavailable => (-32007, "Tenant list is unavailable".to_string()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptRow(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
