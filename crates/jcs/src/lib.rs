//! JIRA Contributor Summary Library
//!
//! This library provides the core functionality for building hierarchy-aware
//! contributor reports from JIRA. It is primarily used by the `jcs` binary and
//! its tests, but can also be embedded in other applications.

pub mod cache;
pub mod cli;
pub mod config;
pub mod contributors;
pub mod domain;
pub mod errors;
pub mod fields;
pub mod hierarchy;
pub mod output;
pub mod report;
pub mod source;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheInfo, JsonFileCache, TicketStore};
pub use contributors::{ContributorSummary, Identity};
pub use domain::{ChildRef, Ticket};
pub use errors::{CacheError, SourceError};
pub use hierarchy::{BuildOutcome, Diagnostic, HierarchyBuilder, HierarchyNode};
pub use output::{ExitCode, JsonError, JsonOutput};
pub use source::{Credentials, JiraSource, TicketSource};
