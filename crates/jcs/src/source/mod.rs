//! Ticket source abstraction.
//!
//! A [`TicketSource`] hands the hierarchy builder fully parsed tickets,
//! children already discovered and contributor fields already resolved.
//! [`JiraSource`] talks to a real JIRA REST API; [`InMemorySource`] backs
//! tests and records every fetch it serves.

use crate::domain::Ticket;
use crate::errors::SourceError;

pub mod jira;
pub mod memory;

pub use jira::{Credentials, JiraSource};

#[allow(unused_imports)] // Public API used only in tests, not in binary
pub use memory::InMemorySource;

/// Trait for backends that can produce tickets.
pub trait TicketSource {
    /// Fetch one ticket by key.
    ///
    /// The returned ticket carries its discovered children and resolved
    /// contributor fields.
    ///
    /// # Errors
    ///
    /// - [`SourceError::NotFound`] when the source does not know the key
    /// - [`SourceError::Auth`] when credentials are rejected
    /// - [`SourceError::Transient`] for network or server-side failures
    fn fetch_by_id(&self, key: &str) -> Result<Ticket, SourceError>;

    /// Fetch the unresolved root tickets of a project.
    ///
    /// Returns tickets of the given issue types in the source's ranked
    /// order. The order is part of the contract; the hierarchy preserves
    /// it for roots.
    ///
    /// # Errors
    ///
    /// Same classification as [`TicketSource::fetch_by_id`].
    fn search(&self, project: &str, issue_types: &[String]) -> Result<Vec<Ticket>, SourceError>;
}
