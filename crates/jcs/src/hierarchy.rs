//! Hierarchy builder: root discovery, cached traversal, and the rules
//! that keep the result a forest.
//!
//! The builder walks from the root tickets of a project (or a single
//! starting ticket) through child references, resolving every ticket
//! through the cache before it touches the source. A ticket is attached
//! where it is first discovered; later references to it are recorded as
//! diagnostics and skipped, which also makes reference cycles terminate.
//! A child that cannot be fetched costs its subtree, never the run.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;

use crate::cache::{CacheEntry, TicketStore};
use crate::domain::{ChildRef, Ticket};
use crate::errors::SourceError;
use crate::source::TicketSource;

/// One node of the retained hierarchy. Children are in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    pub key: String,
    pub children: Vec<HierarchyNode>,
}

/// Non-fatal events observed while building.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A ticket was referenced again after already being attached.
    DuplicateSkipped {
        key: String,
        /// Parent holding the skipped reference; `None` for a duplicate root
        parent: Option<String>,
    },
    /// A referenced child could not be fetched; its subtree is absent.
    DanglingReference {
        parent: String,
        child: String,
        reason: String,
    },
    /// The source could not list a ticket's linked children; the subtree
    /// under it may be missing entries.
    ChildrenIncomplete { key: String, detail: String },
    /// The cache failed and the builder fell back to the source.
    CacheDegraded { key: String, detail: String },
}

impl Diagnostic {
    /// Human-readable one-liner for warning output.
    pub fn describe(&self) -> String {
        match self {
            Diagnostic::DuplicateSkipped { key, parent: Some(parent) } => {
                format!(
                    "{} is already in the hierarchy; reference under {} skipped",
                    key, parent
                )
            }
            Diagnostic::DuplicateSkipped { key, parent: None } => {
                format!("{} is already in the hierarchy; duplicate root skipped", key)
            }
            Diagnostic::DanglingReference { parent, child, reason } => {
                format!("{} references {}, which could not be fetched: {}", parent, child, reason)
            }
            Diagnostic::ChildrenIncomplete { key, detail } => {
                format!("{} may be missing children; the link search failed: {}", key, detail)
            }
            Diagnostic::CacheDegraded { key, detail } => {
                format!("cache unavailable for {}: {}", key, detail)
            }
        }
    }
}

/// Counters for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Tickets retained in the hierarchy
    pub tickets: usize,
    /// Round trips to the source (`fetch_by_id` calls)
    pub source_fetches: usize,
    /// Tickets served from the cache
    pub cache_hits: usize,
    /// Cache records refreshed from search results already in hand
    pub cache_refreshes: usize,
}

/// Everything a build produces.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Retained forest, roots in source order
    pub forest: Vec<HierarchyNode>,
    /// Every retained ticket, keyed by ticket key
    pub tickets: BTreeMap<String, Ticket>,
    /// Non-fatal events, in occurrence order
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BuildStats,
}

/// A flattened hierarchy row for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub key: String,
    /// Nesting depth; roots are 0
    pub depth: usize,
    pub summary: String,
    pub issue_type: String,
    pub status: String,
    /// Browse URL on the source instance
    pub url: String,
}

impl BuildOutcome {
    /// Flatten the forest into pre-order rows with browse URLs.
    pub fn display_rows(&self, base_url: &str) -> Vec<DisplayRow> {
        let base = base_url.trim_end_matches('/');
        let mut rows = Vec::new();
        let mut stack: Vec<(&HierarchyNode, usize)> =
            self.forest.iter().rev().map(|node| (node, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            if let Some(ticket) = self.tickets.get(&node.key) {
                rows.push(DisplayRow {
                    key: node.key.clone(),
                    depth,
                    summary: ticket.summary.clone(),
                    issue_type: ticket.issue_type.clone(),
                    status: ticket.status.clone(),
                    url: format!("{}/browse/{}", base, node.key),
                });
            }
            for child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        rows
    }
}

/// Builds ticket hierarchies through a cache-first resolution policy.
pub struct HierarchyBuilder<S: TicketSource, C: TicketStore> {
    source: S,
    store: C,
}

impl<S: TicketSource, C: TicketStore> HierarchyBuilder<S, C> {
    pub fn new(source: S, store: C) -> Self {
        Self { source, store }
    }

    /// Build the full hierarchy of a project from its unresolved roots.
    ///
    /// Root discovery failures are fatal. So are authentication failures
    /// anywhere; every other per-ticket failure is downgraded to a
    /// diagnostic.
    pub fn build(&self, project: &str, root_types: &[String]) -> Result<BuildOutcome, SourceError> {
        let roots = self.source.search(project, root_types)?;

        let mut state = TraversalState::default();
        for root in roots {
            if state.visited.contains(&root.key) {
                state.diagnostics.push(Diagnostic::DuplicateSkipped {
                    key: root.key.clone(),
                    parent: None,
                });
                continue;
            }
            let root = self.admit_root(root, &mut state);
            state.roots.push(root.key.clone());
            self.traverse_from(root, &mut state)?;
        }
        Ok(state.into_outcome())
    }

    /// Build the hierarchy reachable from one starting ticket.
    ///
    /// The start resolves through the cache like any other reference;
    /// failing to resolve it is fatal.
    pub fn build_from_ticket(&self, key: &str) -> Result<BuildOutcome, SourceError> {
        let mut state = TraversalState::default();
        let start = self.resolve(&ChildRef::new(key), &mut state)?;
        state.roots.push(start.key.clone());
        self.traverse_from(start, &mut state)?;
        Ok(state.into_outcome())
    }

    /// Expand every ticket reachable from `start`, attach-once.
    fn traverse_from(
        &self,
        start: Ticket,
        state: &mut TraversalState,
    ) -> Result<(), SourceError> {
        state.admit(start.clone());
        let mut stack = vec![start.key];

        while let Some(parent_key) = stack.pop() {
            let child_refs = state
                .tickets
                .get(&parent_key)
                .map(|ticket| ticket.children.clone())
                .unwrap_or_default();

            let mut attached = Vec::new();
            for child in child_refs {
                if state.visited.contains(&child.key) {
                    state.diagnostics.push(Diagnostic::DuplicateSkipped {
                        key: child.key.clone(),
                        parent: Some(parent_key.clone()),
                    });
                    continue;
                }
                match self.resolve(&child, state) {
                    Ok(ticket) => {
                        state.admit(ticket);
                        attached.push(child.key.clone());
                    }
                    Err(err @ SourceError::Auth(_)) => return Err(err),
                    Err(err) => {
                        state.diagnostics.push(Diagnostic::DanglingReference {
                            parent: parent_key.clone(),
                            child: child.key.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }

            // Reverse so the leftmost child is expanded first
            for key in attached.iter().rev() {
                stack.push(key.clone());
            }
            if !attached.is_empty() {
                state.children.insert(parent_key, attached);
            }
        }
        Ok(())
    }

    /// Resolve a reference, cache first.
    ///
    /// A reference with a modification timestamp refetches only when the
    /// store says the record is stale. One without a timestamp trusts any
    /// existing record. Cache failures degrade to a miss with a
    /// diagnostic; the run keeps going against the source.
    fn resolve(&self, reference: &ChildRef, state: &mut TraversalState) -> Result<Ticket, SourceError> {
        let stale = match reference.updated {
            Some(current) => self.check_stale(&reference.key, current, state),
            None => false,
        };
        if !stale {
            if let Some(entry) = self.lookup(&reference.key, state) {
                state.stats.cache_hits += 1;
                return Ok(entry.ticket);
            }
        }
        self.fetch_and_store(&reference.key, state)
    }

    /// Refresh the cache from a root already fetched by the search.
    ///
    /// A root with an incomplete child list is used for this run but never
    /// written to the store; the next run repeats the link search.
    fn admit_root(&self, ticket: Ticket, state: &mut TraversalState) -> Ticket {
        if let Some(detail) = &ticket.children_incomplete {
            state.diagnostics.push(Diagnostic::ChildrenIncomplete {
                key: ticket.key.clone(),
                detail: detail.clone(),
            });
            return ticket;
        }
        if self.check_stale(&ticket.key, ticket.updated, state) {
            self.store_entry(CacheEntry::new(ticket.clone(), Utc::now()), state);
            state.stats.cache_refreshes += 1;
        } else {
            state.stats.cache_hits += 1;
        }
        ticket
    }

    fn fetch_and_store(&self, key: &str, state: &mut TraversalState) -> Result<Ticket, SourceError> {
        let ticket = self.source.fetch_by_id(key)?;
        state.stats.source_fetches += 1;
        // A truncated child list must not persist past this run
        match &ticket.children_incomplete {
            Some(detail) => state.diagnostics.push(Diagnostic::ChildrenIncomplete {
                key: ticket.key.clone(),
                detail: detail.clone(),
            }),
            None => self.store_entry(CacheEntry::new(ticket.clone(), Utc::now()), state),
        }
        Ok(ticket)
    }

    fn check_stale(&self, key: &str, current: chrono::DateTime<Utc>, state: &mut TraversalState) -> bool {
        match self.store.is_stale(key, current) {
            Ok(stale) => stale,
            Err(err) => {
                state.diagnostics.push(Diagnostic::CacheDegraded {
                    key: key.to_string(),
                    detail: err.to_string(),
                });
                true
            }
        }
    }

    fn lookup(&self, key: &str, state: &mut TraversalState) -> Option<CacheEntry> {
        match self.store.get(key) {
            Ok(entry) => entry,
            Err(err) => {
                state.diagnostics.push(Diagnostic::CacheDegraded {
                    key: key.to_string(),
                    detail: err.to_string(),
                });
                None
            }
        }
    }

    fn store_entry(&self, entry: CacheEntry, state: &mut TraversalState) {
        if let Err(err) = self.store.put(&entry) {
            state.diagnostics.push(Diagnostic::CacheDegraded {
                key: entry.key.clone(),
                detail: err.to_string(),
            });
        }
    }
}

#[derive(Default)]
struct TraversalState {
    visited: HashSet<String>,
    tickets: BTreeMap<String, Ticket>,
    children: BTreeMap<String, Vec<String>>,
    roots: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    stats: BuildStats,
}

impl TraversalState {
    fn admit(&mut self, ticket: Ticket) {
        self.visited.insert(ticket.key.clone());
        self.tickets.insert(ticket.key.clone(), ticket);
        self.stats.tickets += 1;
    }

    fn into_outcome(self) -> BuildOutcome {
        let forest = self
            .roots
            .iter()
            .map(|root| build_node(root, &self.children))
            .collect();
        BuildOutcome {
            forest,
            tickets: self.tickets,
            diagnostics: self.diagnostics,
            stats: self.stats,
        }
    }
}

fn build_node(key: &str, children: &BTreeMap<String, Vec<String>>) -> HierarchyNode {
    HierarchyNode {
        key: key.to_string(),
        children: children
            .get(key)
            .map(|keys| keys.iter().map(|k| build_node(k, children)).collect())
            .unwrap_or_default(),
    }
}
