//! JIRA REST backend for the ticket source.
//!
//! Talks to `/rest/api/2` with a short request timeout. Children come from
//! two places: subtask stubs embedded in the issue payload, and JQL link
//! searches ("Epic Link" for epics, "Parent Link" for the planning types
//! above them). Link search results carry the child's modification
//! timestamp, which later drives cache staleness; subtask stubs do not.

use std::time::Duration;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::TicketSource;
use crate::domain::{ChildRef, Ticket};
use crate::errors::SourceError;
use crate::fields::FieldMap;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_SEARCH_RESULTS: &str = "1000";

/// API credentials for a JIRA instance.
///
/// With an email, requests use Basic auth (`email:token`), which is what
/// JIRA Cloud expects for API tokens. Without one, the token is sent as a
/// Bearer token, which is what Server and Data Center PATs expect.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    email: Option<String>,
}

impl Credentials {
    /// Token-only credentials (Bearer auth).
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: None,
        }
    }

    /// Add the account email, switching to Basic auth.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    fn header_value(&self) -> String {
        match &self.email {
            Some(email) => {
                let encoded = BASE64_STANDARD.encode(format!("{}:{}", email, self.token));
                format!("Basic {}", encoded)
            }
            None => format!("Bearer {}", self.token),
        }
    }
}

/// Ticket source backed by a JIRA instance.
pub struct JiraSource {
    base_url: String,
    auth_header: String,
    field_map: FieldMap,
}

impl JiraSource {
    /// Create a source for the given instance.
    ///
    /// A trailing slash on the base URL is tolerated and stripped.
    pub fn new(base_url: &str, credentials: &Credentials, field_map: FieldMap) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: credentials.header_value(),
            field_map,
        }
    }

    fn issue_url(&self, key: &str) -> String {
        format!("{}/rest/api/2/issue/{}", self.base_url, key)
    }

    fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.base_url)
    }

    fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<Value, SourceError> {
        let mut request = ureq::get(url)
            .timeout(REQUEST_TIMEOUT)
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/json");
        for (param, value) in query {
            request = request.query(param, value);
        }
        match request.call() {
            Ok(response) => response
                .into_json()
                .map_err(|e| SourceError::Malformed(format!("response body for {}: {}", context, e))),
            Err(ureq::Error::Status(code, _)) => Err(classify_status(code, context)),
            Err(ureq::Error::Transport(transport)) => {
                Err(SourceError::Transient(transport.to_string()))
            }
        }
    }

    /// Discover link-based children and append them to the ticket.
    ///
    /// Auth failures abort the run. Any other search failure leaves the
    /// ticket with subtask children only and records the reason on it;
    /// callers can then tell a truncated child list from an empty one.
    fn expand_children(&self, ticket: &mut Ticket) -> Result<(), SourceError> {
        let Some(jql) = children_jql(&ticket.issue_type, &ticket.key) else {
            return Ok(());
        };
        match self.child_search(&jql, &ticket.key) {
            Ok(refs) => {
                ticket.children.extend(refs);
                Ok(())
            }
            Err(err @ SourceError::Auth(_)) => Err(err),
            Err(err) => {
                ticket.children_incomplete = Some(err.to_string());
                Ok(())
            }
        }
    }

    fn child_search(&self, jql: &str, context: &str) -> Result<Vec<ChildRef>, SourceError> {
        let payload = self.get_json(
            &self.search_url(),
            &[
                ("jql", jql),
                ("maxResults", MAX_SEARCH_RESULTS),
                ("fields", "updated"),
            ],
            context,
        )?;
        child_refs_from_search(payload)
    }
}

impl TicketSource for JiraSource {
    fn fetch_by_id(&self, key: &str) -> Result<Ticket, SourceError> {
        let payload = self.get_json(&self.issue_url(key), &[("fields", "*all")], key)?;
        let mut ticket = ticket_from_payload(payload, &self.field_map)?;
        self.expand_children(&mut ticket)?;
        Ok(ticket)
    }

    fn search(&self, project: &str, issue_types: &[String]) -> Result<Vec<Ticket>, SourceError> {
        // TODO: page through search results once projects outgrow the
        // first 1000 roots.
        let jql = roots_jql(project, issue_types);
        let payload = self.get_json(
            &self.search_url(),
            &[
                ("jql", &jql),
                ("maxResults", MAX_SEARCH_RESULTS),
                ("fields", "*all"),
            ],
            project,
        )?;
        let results: SearchDto = serde_json::from_value(payload)
            .map_err(|e| SourceError::Malformed(format!("search results: {}", e)))?;

        let mut tickets = Vec::new();
        for issue in results.issues {
            let mut ticket = ticket_from_payload(issue, &self.field_map)?;
            self.expand_children(&mut ticket)?;
            tickets.push(ticket);
        }
        Ok(tickets)
    }
}

fn classify_status(code: u16, context: &str) -> SourceError {
    match code {
        401 | 403 => SourceError::Auth(format!("HTTP {} for {}", code, context)),
        404 => SourceError::NotFound(context.to_string()),
        429 => SourceError::Transient(format!("HTTP 429 (rate limited) for {}", context)),
        500..=599 => SourceError::Transient(format!("HTTP {} for {}", code, context)),
        _ => SourceError::Malformed(format!("HTTP {} for {}", code, context)),
    }
}

/// JQL for the unresolved roots of a project, in rank order.
fn roots_jql(project: &str, issue_types: &[String]) -> String {
    let quoted: Vec<String> = issue_types.iter().map(|t| format!("\"{}\"", t)).collect();
    format!(
        "project = {} AND issuetype in ({}) AND resolution = Unresolved ORDER BY Rank ASC",
        project,
        quoted.join(", ")
    )
}

/// JQL that finds the link-based children of a ticket, if its type has any.
///
/// Epics collect children through "Epic Link"; the planning types above
/// epics (feature-, initiative-, and theme-like names) use "Parent Link".
/// Both match by substring, so instance-specific names like "Portfolio
/// Epic" or "Strategic Initiative" resolve the same way. Other types only
/// ever have subtasks, which arrive embedded in the issue payload.
fn children_jql(issue_type: &str, key: &str) -> Option<String> {
    let lowered = issue_type.to_lowercase();
    if lowered.contains("epic") {
        Some(format!("\"Epic Link\" = \"{}\" ORDER BY Rank ASC", key))
    } else if ["feature", "initiative", "theme"]
        .iter()
        .any(|parent_type| lowered.contains(parent_type))
    {
        Some(format!("\"Parent Link\" = \"{}\" ORDER BY Rank ASC", key))
    } else {
        None
    }
}

#[derive(Deserialize)]
struct SearchDto {
    #[serde(default)]
    issues: Vec<Value>,
}

#[derive(Deserialize)]
struct ChildSearchDto {
    #[serde(default)]
    issues: Vec<ChildIssueDto>,
}

#[derive(Deserialize)]
struct ChildIssueDto {
    key: String,
    #[serde(default)]
    fields: ChildFieldsDto,
}

#[derive(Deserialize, Default)]
struct ChildFieldsDto {
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Deserialize)]
struct IssueDto {
    key: String,
    #[serde(default)]
    fields: FieldsDto,
}

#[derive(Deserialize, Default)]
struct FieldsDto {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    issuetype: Option<NameDto>,
    #[serde(default)]
    status: Option<NameDto>,
    #[serde(default)]
    assignee: Option<UserDto>,
    #[serde(default)]
    reporter: Option<UserDto>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    parent: Option<KeyDto>,
    #[serde(default)]
    subtasks: Vec<KeyDto>,
}

#[derive(Deserialize)]
struct NameDto {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct UserDto {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct KeyDto {
    key: String,
}

/// Convert a raw issue payload into a [`Ticket`].
///
/// Missing fields degrade to empty values rather than failing; only a
/// payload without a key is rejected. The raw payload is retained on the
/// ticket so custom field data survives the conversion.
fn ticket_from_payload(payload: Value, field_map: &FieldMap) -> Result<Ticket, SourceError> {
    let dto: IssueDto = serde_json::from_value(payload.clone())
        .map_err(|e| SourceError::Malformed(format!("issue payload: {}", e)))?;

    let null = Value::Null;
    let fields = payload.get("fields").unwrap_or(&null);
    let additional_assignees = field_map.resolve_additional_assignees(fields);
    let contributors = field_map.resolve_contributors(fields);

    Ok(Ticket {
        key: dto.key,
        summary: dto.fields.summary.unwrap_or_default(),
        issue_type: dto.fields.issuetype.map(|t| t.name).unwrap_or_default(),
        status: dto.fields.status.map(|s| s.name).unwrap_or_default(),
        assignee: dto.fields.assignee.and_then(|u| u.display_name),
        reporter: dto.fields.reporter.and_then(|u| u.display_name),
        additional_assignees,
        contributors,
        parent: dto.fields.parent.map(|p| p.key),
        updated: dto
            .fields
            .updated
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        children: dto
            .fields
            .subtasks
            .into_iter()
            .map(|s| ChildRef::new(s.key))
            .collect(),
        children_incomplete: None,
        raw: payload,
    })
}

/// Convert a child search payload into child references.
fn child_refs_from_search(payload: Value) -> Result<Vec<ChildRef>, SourceError> {
    let results: ChildSearchDto = serde_json::from_value(payload)
        .map_err(|e| SourceError::Malformed(format!("child search results: {}", e)))?;
    Ok(results
        .issues
        .into_iter()
        .map(|issue| {
            match issue.fields.updated.as_deref().and_then(parse_timestamp) {
                Some(updated) => ChildRef::with_updated(issue.key, updated),
                None => ChildRef::new(issue.key),
            }
        })
        .collect())
}

/// Parse a source timestamp into UTC.
///
/// JIRA emits RFC 3339 with a colon-less offset ("2024-03-01T10:00:00.000+0000");
/// some deployments emit a plain Z suffix. Both parse; anything else is `None`.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
