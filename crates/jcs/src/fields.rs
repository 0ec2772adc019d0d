//! Mapping from logical contributor fields to source custom fields.
//!
//! JIRA exposes people beyond assignee and reporter through opaque
//! `customfield_*` entries whose ids differ per instance. A [`FieldMap`]
//! either pins those ids explicitly or, by default, scans every custom
//! field for user-shaped values. Resolution happens once, at fetch time;
//! the rest of the crate only ever sees plain display names.

use serde_json::Value;

/// Resolves contributor display names out of a raw ticket payload.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    additional_assignees: Option<String>,
    contributors: Option<String>,
}

impl FieldMap {
    /// Pin the additional-assignees field to a concrete id
    /// (e.g. "customfield_10500") instead of scanning.
    pub fn with_additional_assignees(mut self, field_id: impl Into<String>) -> Self {
        self.additional_assignees = Some(field_id.into());
        self
    }

    /// Pin the contributors field to a concrete id.
    pub fn with_contributors(mut self, field_id: impl Into<String>) -> Self {
        self.contributors = Some(field_id.into());
        self
    }

    /// Display names from additional-assignee style fields.
    ///
    /// With a pinned id, reads exactly that field. Otherwise scans every
    /// `customfield_*` entry for user objects or lists of user objects.
    /// `fields` is the `fields` object of a raw issue payload.
    pub fn resolve_additional_assignees(&self, fields: &Value) -> Vec<String> {
        match &self.additional_assignees {
            Some(id) => display_names_at(fields, id),
            None => scan_custom_user_fields(fields),
        }
    }

    /// Display names from the contributors field.
    ///
    /// Defaults to a field literally named "contributors"; instances that
    /// expose it as a custom field pin the id instead.
    pub fn resolve_contributors(&self, fields: &Value) -> Vec<String> {
        let field = self.contributors.as_deref().unwrap_or("contributors");
        display_names_at(fields, field)
    }
}

/// Extract display names from one named field.
///
/// Handles a single user object, a list of user objects, and a list of
/// plain strings. Anything else yields nothing.
fn display_names_at(fields: &Value, name: &str) -> Vec<String> {
    match fields.get(name) {
        Some(value) => display_names_in(value),
        None => Vec::new(),
    }
}

fn display_names_in(value: &Value) -> Vec<String> {
    match value {
        Value::Object(_) => display_name_of(value).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                _ => display_name_of(item),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn display_name_of(value: &Value) -> Option<String> {
    value
        .get("displayName")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Scan every `customfield_*` entry for user-shaped values.
fn scan_custom_user_fields(fields: &Value) -> Vec<String> {
    let Some(map) = fields.as_object() else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for (field, value) in map {
        if !field.starts_with("customfield_") {
            continue;
        }
        match value {
            Value::Object(_) => names.extend(display_name_of(value)),
            Value::Array(items) => {
                names.extend(items.iter().filter_map(display_name_of));
            }
            _ => {}
        }
    }
    names
}
