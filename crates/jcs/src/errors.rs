//! Typed errors for the ticket source and the local cache.
//!
//! Source errors carry a retryability distinction: authentication failures
//! abort a run, transient failures may be retried, and unknown keys are
//! reported per ticket. Cache errors are deliberately separate from the
//! "no entry" case so callers can tell a broken store from an empty one.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a ticket source backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// Credentials were rejected or missing. Never retryable.
    #[error("Authentication with the ticket source failed: {0}")]
    Auth(String),

    /// Network failure or a server-side error. Retrying may succeed.
    #[error("Ticket source unavailable: {0}")]
    Transient(String),

    /// The source does not know the requested key.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// The source answered with a payload that does not parse.
    #[error("Malformed response from ticket source: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether a retry of the same request could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

/// Errors surfaced by the ticket cache.
///
/// A missing record is not an error; `TicketStore::get` returns `Ok(None)`
/// for that. These variants cover an actually broken store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying file system operation failed.
    #[error("Cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record exists but its contents do not parse.
    #[error("Corrupt cache record at {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },
}
