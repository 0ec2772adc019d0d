//! In-memory cache backend for testing.
//!
//! Keeps records in a shared map. Cloning shares the data, so tests can
//! hold one handle and give another to the code under test.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use super::{CacheEntry, CacheInfo, TicketStore};
use crate::errors::CacheError;

/// Shared in-memory ticket cache.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Rc<RefCell<HashMap<String, CacheEntry>>>,
    fail_reads: Rc<RefCell<bool>>,
}

impl InMemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail, as a broken backing store would.
    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.borrow_mut() = fail;
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn injected_error() -> CacheError {
        CacheError::Io {
            path: PathBuf::from("<memory>"),
            source: std::io::Error::new(ErrorKind::Other, "injected read failure"),
        }
    }
}

impl TicketStore for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        if *self.fail_reads.borrow() {
            return Err(Self::injected_error());
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.entries
            .borrow_mut()
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn info(&self) -> Result<CacheInfo, CacheError> {
        let entries = self.entries.borrow();
        let total_size_bytes = entries
            .values()
            .map(|entry| {
                serde_json::to_vec(entry)
                    .map(|bytes| bytes.len() as u64)
                    .unwrap_or(0)
            })
            .sum();
        Ok(CacheInfo {
            entry_count: entries.len(),
            total_size_bytes,
            location: "<memory>".to_string(),
        })
    }
}
