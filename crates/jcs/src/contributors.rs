//! Contributor identity and bottom-up aggregation.
//!
//! Display names arrive from the source in whatever shape people typed
//! them. [`Identity`] normalizes them so "Alice  Adams" and "alice adams"
//! collapse to one contributor while the first-seen spelling survives for
//! display. Aggregation walks the retained forest bottom-up: a ticket's
//! contributor set is its own people plus everything its descendants
//! contributed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::domain::Ticket;
use crate::hierarchy::HierarchyNode;

/// Placeholder the source uses for tickets nobody owns.
const UNASSIGNED: &str = "unassigned";

/// A contributor, deduplicated by normalized name.
///
/// Equality, ordering, and hashing all use the canonical form only; the
/// display form is presentation data.
#[derive(Debug, Clone)]
pub struct Identity {
    canonical: String,
    display: String,
}

impl Identity {
    /// Normalize a raw display name into an identity.
    ///
    /// Trims, collapses internal whitespace runs, and lowercases for the
    /// canonical form. Empty names and the unassigned placeholder yield
    /// `None`.
    pub fn parse(raw: &str) -> Option<Identity> {
        let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if display.is_empty() {
            return None;
        }
        let canonical = display.to_lowercase();
        if canonical == UNASSIGNED {
            return None;
        }
        Some(Identity { canonical, display })
    }

    /// Normalized form used for identity.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// First-seen spelling, for rendering.
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Identity {}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

/// Contributor sets per ticket key, each covering the ticket's subtree.
pub type ContributorSummary = BTreeMap<String, BTreeSet<Identity>>;

/// Contributors named directly on one ticket.
///
/// Draws from the assignee, the reporter, additional-assignee custom
/// fields, and the contributors field. Insertion order decides which
/// spelling survives when variants collide.
pub fn extract(ticket: &Ticket) -> BTreeSet<Identity> {
    let mut people = BTreeSet::new();
    let named = ticket
        .assignee
        .iter()
        .chain(ticket.reporter.iter())
        .chain(ticket.additional_assignees.iter())
        .chain(ticket.contributors.iter());
    for name in named {
        if let Some(identity) = Identity::parse(name) {
            people.insert(identity);
        }
    }
    people
}

/// Aggregate contributors bottom-up over the retained forest.
///
/// Every node in the forest gets an entry covering itself and its whole
/// subtree. The forest is attach-once, so each node is computed exactly
/// once.
pub fn summarize(forest: &[HierarchyNode], tickets: &BTreeMap<String, Ticket>) -> ContributorSummary {
    let mut summary = ContributorSummary::new();
    for root in forest {
        aggregate_node(root, tickets, &mut summary);
    }
    summary
}

fn aggregate_node(
    node: &HierarchyNode,
    tickets: &BTreeMap<String, Ticket>,
    summary: &mut ContributorSummary,
) -> BTreeSet<Identity> {
    let mut people = tickets.get(&node.key).map(extract).unwrap_or_default();
    for child in &node.children {
        people.extend(aggregate_node(child, tickets, summary));
    }
    summary.insert(node.key.clone(), people.clone());
    people
}

/// Every distinct contributor across all retained tickets.
pub fn unique_contributors(tickets: &BTreeMap<String, Ticket>) -> BTreeSet<Identity> {
    let mut people = BTreeSet::new();
    for ticket in tickets.values() {
        people.extend(extract(ticket));
    }
    people
}
