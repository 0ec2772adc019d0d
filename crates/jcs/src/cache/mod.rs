//! Local ticket cache keyed by ticket key.
//!
//! The cache exists so repeated runs only refetch tickets the source has
//! actually modified. [`TicketStore`] is the persistence contract;
//! [`JsonFileCache`] is the production backend and [`InMemoryCache`]
//! backs tests.

use crate::domain::Ticket;
use crate::errors::CacheError;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod json;
pub mod memory;

pub use json::JsonFileCache;

#[allow(unused_imports)] // Public API used only in tests, not in binary
pub use memory::InMemoryCache;

/// One cached ticket record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Ticket key this record is stored under
    pub key: String,
    /// The cached ticket, children and all
    pub ticket: Ticket,
    /// When this record was written
    pub fetched_at: DateTime<Utc>,
    /// Source modification timestamp observed at fetch time
    pub source_updated: DateTime<Utc>,
}

impl CacheEntry {
    /// Build a record for a freshly fetched ticket.
    pub fn new(ticket: Ticket, fetched_at: DateTime<Utc>) -> Self {
        Self {
            key: ticket.key.clone(),
            source_updated: ticket.updated,
            ticket,
            fetched_at,
        }
    }
}

/// Cache statistics, as reported by `jcs cache-info`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheInfo {
    /// Number of cached ticket records
    pub entry_count: usize,
    /// Combined size of all records in bytes
    pub total_size_bytes: u64,
    /// Where the cache lives
    pub location: String,
}

/// Trait for cache backends that persist ticket records.
///
/// Implementations must be `Clone` to support shared access patterns.
/// A missing record is `Ok(None)`, never an error; `CacheError` means the
/// store itself is broken and callers decide whether to degrade or abort.
///
/// # Examples
///
/// ```no_run
/// use chrono::Utc;
/// use jcs::cache::{CacheEntry, InMemoryCache, TicketStore};
/// use jcs::domain::Ticket;
///
/// let cache = InMemoryCache::new();
/// let ticket = Ticket::new("PROJ-1", "Fix login flow", "Bug");
/// cache.put(&CacheEntry::new(ticket, Utc::now())).unwrap();
/// assert!(cache.get("PROJ-1").unwrap().is_some());
/// ```
pub trait TicketStore: Clone {
    /// Load the record for a key, or `None` if nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or parsed.
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Write a record, replacing any previous one for the same key.
    ///
    /// The replacement is whole-record: a reader sees either the old record
    /// or the new one, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or persisted.
    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Whether the cached copy of `key` is out of date.
    ///
    /// Stale means no record exists, or the source reports a strictly newer
    /// modification timestamp than the record carries. An equal timestamp is
    /// fresh. This comparison is the sole staleness policy; callers never
    /// compare timestamps themselves.
    ///
    /// # Errors
    ///
    /// Propagates read failures from [`TicketStore::get`].
    fn is_stale(&self, key: &str, source_updated: DateTime<Utc>) -> Result<bool, CacheError> {
        Ok(match self.get(key)? {
            None => true,
            Some(entry) => source_updated > entry.source_updated,
        })
    }

    /// Remove every cached record.
    ///
    /// # Errors
    ///
    /// Returns an error if existing records cannot be removed. An already
    /// empty cache is not an error.
    fn clear(&self) -> Result<(), CacheError>;

    /// Report entry count, total size, and location.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be inspected.
    fn info(&self) -> Result<CacheInfo, CacheError>;
}
