//! In-memory ticket source for testing.
//!
//! Serves tickets from a map and logs every `fetch_by_id` call, so tests
//! can assert exactly how many source round trips a build performed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::TicketSource;
use crate::domain::Ticket;
use crate::errors::SourceError;

/// Shared in-memory ticket source.
///
/// Cloning shares the tickets and the fetch log.
#[derive(Clone, Default)]
pub struct InMemorySource {
    tickets: Rc<RefCell<HashMap<String, Ticket>>>,
    // Insertion order; search results must be deterministic
    order: Rc<RefCell<Vec<String>>>,
    fetch_log: Rc<RefCell<Vec<String>>>,
    fail_with: Rc<RefCell<Option<SourceError>>>,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticket, replacing any previous one with the same key.
    pub fn insert(&self, ticket: Ticket) {
        let key = ticket.key.clone();
        let mut tickets = self.tickets.borrow_mut();
        if tickets.insert(key.clone(), ticket).is_none() {
            self.order.borrow_mut().push(key);
        }
    }

    /// Remove a ticket, simulating deletion on the source side.
    pub fn remove(&self, key: &str) {
        self.tickets.borrow_mut().remove(key);
        self.order.borrow_mut().retain(|k| k != key);
    }

    /// Fail every subsequent call with a clone of the given error.
    pub fn fail_with(&self, error: SourceError) {
        *self.fail_with.borrow_mut() = Some(error);
    }

    /// Total number of `fetch_by_id` calls served or attempted.
    pub fn fetch_count(&self) -> usize {
        self.fetch_log.borrow().len()
    }

    /// Number of `fetch_by_id` calls for one key.
    pub fn fetch_count_for(&self, key: &str) -> usize {
        self.fetch_log.borrow().iter().filter(|k| *k == key).count()
    }
}

impl TicketSource for InMemorySource {
    fn fetch_by_id(&self, key: &str) -> Result<Ticket, SourceError> {
        self.fetch_log.borrow_mut().push(key.to_string());
        if let Some(error) = self.fail_with.borrow().clone() {
            return Err(error);
        }
        self.tickets
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }

    fn search(&self, project: &str, issue_types: &[String]) -> Result<Vec<Ticket>, SourceError> {
        if let Some(error) = self.fail_with.borrow().clone() {
            return Err(error);
        }
        let prefix = format!("{}-", project);
        let tickets = self.tickets.borrow();
        let results = self
            .order
            .borrow()
            .iter()
            .filter_map(|key| tickets.get(key))
            .filter(|ticket| ticket.key.starts_with(&prefix))
            .filter(|ticket| {
                issue_types
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&ticket.issue_type))
            })
            .cloned()
            .collect();
        Ok(results)
    }
}
