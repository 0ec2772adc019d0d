//! Core domain types for the contributor summary.
//!
//! A [`Ticket`] is a source issue reduced to the fields the hierarchy and
//! the report need. The full source payload is kept alongside so custom
//! field resolution does not lose information the summary fields drop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to a child ticket discovered on a parent.
///
/// `updated` carries the child's source modification timestamp when the
/// discovery mechanism reports one (link searches do, subtask stubs do
/// not). A reference without a timestamp resolves against the cache alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRef {
    /// Ticket key of the referenced child (e.g. "PROJ-42")
    pub key: String,
    /// Source modification timestamp, when the discovery reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl ChildRef {
    /// Create a reference with no modification timestamp.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            updated: None,
        }
    }

    /// Create a reference carrying the child's modification timestamp.
    pub fn with_updated(key: impl Into<String>, updated: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            updated: Some(updated),
        }
    }
}

/// A single ticket as the summary sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket key (e.g. "PROJ-42")
    pub key: String,
    /// Short summary line
    pub summary: String,
    /// Issue type name as reported by the source (e.g. "Feature", "Bug")
    pub issue_type: String,
    /// Status name as reported by the source (e.g. "In Progress")
    pub status: String,
    /// Display name of the assignee, if any
    pub assignee: Option<String>,
    /// Display name of the reporter, if any
    pub reporter: Option<String>,
    /// Display names from additional-assignee style custom fields
    #[serde(default)]
    pub additional_assignees: Vec<String>,
    /// Display names from an explicit contributors field
    #[serde(default)]
    pub contributors: Vec<String>,
    /// Key of the parent ticket; `None` for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Last source modification timestamp; drives cache staleness
    pub updated: DateTime<Utc>,
    /// Children discovered on this ticket, in discovery order
    #[serde(default)]
    pub children: Vec<ChildRef>,
    /// Reason the children list may be incomplete; set when the source
    /// could not finish enumerating linked children. Not serialized.
    #[serde(skip)]
    pub children_incomplete: Option<String>,
    /// Full source payload for custom field resolution
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Ticket {
    /// Create a ticket with default values.
    ///
    /// `updated` starts at the minimum timestamp, meaning "no modification
    /// known"; any real source timestamp compares newer.
    pub fn new(
        key: impl Into<String>,
        summary: impl Into<String>,
        issue_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            issue_type: issue_type.into(),
            status: String::new(),
            assignee: None,
            reporter: None,
            additional_assignees: Vec::new(),
            contributors: Vec::new(),
            parent: None,
            updated: DateTime::<Utc>::MIN_UTC,
            children: Vec::new(),
            children_incomplete: None,
            raw: serde_json::Value::Null,
        }
    }

    /// Project key derived from the ticket key prefix, if it has one.
    pub fn project_key(&self) -> Option<&str> {
        self.key.rsplit_once('-').map(|(prefix, _)| prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_ticket_has_minimum_updated_timestamp() {
        let ticket = Ticket::new("PROJ-1", "Do the thing", "Feature");
        assert_eq!(ticket.updated, DateTime::<Utc>::MIN_UTC);
        assert!(ticket.children.is_empty());
        assert!(ticket.assignee.is_none());
    }

    #[test]
    fn test_project_key_strips_the_sequence_number() {
        let ticket = Ticket::new("PROJ-123", "t", "Bug");
        assert_eq!(ticket.project_key(), Some("PROJ"));

        let odd = Ticket::new("ABC-DEF-9", "t", "Bug");
        assert_eq!(odd.project_key(), Some("ABC-DEF"));

        let bare = Ticket::new("NOKEY", "t", "Bug");
        assert_eq!(bare.project_key(), None);
    }

    #[test]
    fn test_child_ref_serialization_omits_absent_timestamp() {
        let plain = ChildRef::new("PROJ-2");
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("updated"));

        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let dated = ChildRef::with_updated("PROJ-3", ts);
        let json = serde_json::to_string(&dated).unwrap();
        assert!(json.contains("updated"));

        let back: ChildRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dated);
    }

    #[test]
    fn test_ticket_deserializes_without_optional_fields() {
        let json = r#"{
            "key": "PROJ-7",
            "summary": "Minimal record",
            "issue_type": "Bug",
            "status": "Open",
            "assignee": null,
            "reporter": null,
            "updated": "2024-01-01T00:00:00Z"
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.key, "PROJ-7");
        assert!(ticket.children.is_empty());
        assert!(ticket.contributors.is_empty());
        assert!(ticket.parent.is_none());
        assert_eq!(ticket.raw, serde_json::Value::Null);
    }

    #[test]
    fn test_children_incomplete_marker_never_persists() {
        let mut ticket = Ticket::new("PROJ-4", "t", "Epic");
        ticket.children_incomplete = Some("search failed".to_string());

        let json = serde_json::to_string(&ticket).unwrap();
        assert!(!json.contains("children_incomplete"));

        let back: Ticket = serde_json::from_str(&json).unwrap();
        assert!(back.children_incomplete.is_none());
    }
}
