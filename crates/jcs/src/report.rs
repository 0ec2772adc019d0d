//! HTML report rendering.
//!
//! Produces a single self-contained page styled with PatternFly: a header,
//! three stat cards, and three views the cards toggle between (all tickets
//! with hierarchy indentation, root tickets only, and a per-contributor
//! breakdown of top-level tickets). No templating engine; the page is
//! assembled with plain string building like the other exports.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::contributors::{ContributorSummary, Identity};
use crate::hierarchy::DisplayRow;

/// Visual bucket for a source status name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Done,
    InProgress,
    ToDo,
    /// Anything unrecognized gets default styling
    Other,
}

impl StatusClass {
    /// Classify a status name by common JIRA conventions.
    pub fn from_status(name: &str) -> Self {
        let lowered = name.to_lowercase();
        const DONE: [&str; 4] = ["done", "closed", "resolved", "complete"];
        const IN_PROGRESS: [&str; 4] = ["in progress", "in-progress", "development", "review"];
        const TO_DO: [&str; 5] = ["to do", "to-do", "open", "new", "backlog"];

        if DONE.iter().any(|s| lowered.contains(s)) {
            StatusClass::Done
        } else if IN_PROGRESS.iter().any(|s| lowered.contains(s)) {
            StatusClass::InProgress
        } else if TO_DO.iter().any(|s| lowered.contains(s)) {
            StatusClass::ToDo
        } else {
            StatusClass::Other
        }
    }

    /// PatternFly label modifier for the status chip.
    fn label_modifier(self) -> &'static str {
        match self {
            StatusClass::Done => "pf-m-green",
            StatusClass::InProgress => "pf-m-orange",
            StatusClass::ToDo | StatusClass::Other => "pf-m-grey",
        }
    }
}

/// Render the report page.
///
/// `rows` is the flattened hierarchy in display order; `summary` maps each
/// ticket key to the contributors of its subtree.
pub fn render(
    rows: &[DisplayRow],
    summary: &ContributorSummary,
    project_key: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let contributors = contributors_by_root(rows, summary);
    let root_count = rows.iter().filter(|row| row.depth == 0).count();

    let mut output = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("    <meta charset=\"UTF-8\">\n");
    output.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!(
        "    <title>JIRA Contributor Summary - {}</title>\n",
        html_escape(project_key)
    ));
    output.push_str(
        "    <link rel=\"stylesheet\" href=\"https://unpkg.com/@patternfly/patternfly/patternfly.css\">\n",
    );
    output.push_str(STYLE);
    output.push_str("</head>\n<body class=\"pf-c-page\">\n");
    output.push_str("    <div class=\"pf-c-page__main\">\n");

    // Header
    output.push_str("        <section class=\"pf-c-page__main-section pf-m-light\">\n");
    output.push_str("            <div class=\"pf-c-content\">\n");
    output.push_str("                <div class=\"pf-c-card custom-header\">\n");
    output.push_str("                    <div class=\"pf-c-card__body\">\n");
    output.push_str(
        "                        <h1 class=\"pf-c-title pf-m-2xl\" style=\"color: white; margin-bottom: 0.5rem;\">JIRA Contributor Summary</h1>\n",
    );
    output.push_str(&format!(
        "                        <p style=\"color: rgba(255,255,255,0.9); margin: 0;\">Project: {} | Generated: {}</p>\n",
        html_escape(project_key),
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str("                    </div>\n");
    output.push_str("                </div>\n");
    output.push_str("            </div>\n");
    output.push_str("        </section>\n\n");

    // Stat cards toggling the three views
    output.push_str("        <section class=\"pf-c-page__main-section\">\n");
    output.push_str(
        "            <div class=\"pf-l-gallery pf-m-gutter\" style=\"--pf-l-gallery--GridTemplateColumns--min: 180px;\">\n",
    );
    output.push_str(&stat_card(
        "tickets-card",
        "showTicketsView()",
        rows.len(),
        "Total Tickets",
        true,
    ));
    output.push_str(&stat_card(
        "root-tickets-card",
        "showRootTicketsView()",
        root_count,
        "Root Tickets",
        false,
    ));
    output.push_str(&stat_card(
        "contributors-card",
        "showContributorsView()",
        contributors.len(),
        "Unique Contributors",
        false,
    ));
    output.push_str("            </div>\n");
    output.push_str("        </section>\n\n");

    // Views
    output.push_str("        <section class=\"pf-c-page__main-section\">\n");

    output.push_str("            <div class=\"pf-c-card tickets-container\">\n");
    output.push_str("                <div class=\"pf-c-card__body\">\n");
    for row in rows {
        output.push_str(&ticket_row(row, summary));
    }
    output.push_str("                </div>\n");
    output.push_str("            </div>\n\n");

    output.push_str(
        "            <div class=\"pf-c-card root-tickets-container\" id=\"root-tickets-container\" style=\"display: none;\">\n",
    );
    output.push_str("                <div class=\"pf-c-card__body\">\n");
    for row in rows.iter().filter(|row| row.depth == 0) {
        output.push_str(&ticket_row(row, summary));
    }
    output.push_str("                </div>\n");
    output.push_str("            </div>\n\n");

    output.push_str(
        "            <div class=\"pf-c-card contributors-container\" id=\"contributors-container\" style=\"display: none;\">\n",
    );
    output.push_str("                <div class=\"pf-c-card__body\">\n");
    for (identity, tickets) in &contributors {
        output.push_str(&contributor_block(identity, tickets));
    }
    output.push_str("                </div>\n");
    output.push_str("            </div>\n");
    output.push_str("        </section>\n");
    output.push_str("    </div>\n\n");
    output.push_str(SCRIPT);
    output.push_str("</body>\n</html>\n");
    output
}

/// Contributors of each root subtree, with the roots they contribute to.
///
/// This drives the contributors view: one entry per distinct contributor,
/// listing only top-level tickets, sorted by key.
fn contributors_by_root<'a>(
    rows: &'a [DisplayRow],
    summary: &'a ContributorSummary,
) -> BTreeMap<&'a Identity, Vec<&'a DisplayRow>> {
    let mut contributors: BTreeMap<&Identity, Vec<&DisplayRow>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.depth == 0) {
        if let Some(people) = summary.get(&row.key) {
            for identity in people {
                contributors.entry(identity).or_default().push(row);
            }
        }
    }
    for tickets in contributors.values_mut() {
        tickets.sort_by(|a, b| a.key.cmp(&b.key));
    }
    contributors
}

fn stat_card(id: &str, onclick: &str, count: usize, caption: &str, selected: bool) -> String {
    let selected_class = if selected { " pf-m-selected" } else { "" };
    let mut out = String::new();
    out.push_str(&format!(
        "                <div class=\"pf-c-card pf-m-selectable custom-stat-card{}\" id=\"{}\" onclick=\"{}\">\n",
        selected_class, id, onclick
    ));
    out.push_str("                    <div class=\"pf-c-card__body pf-m-no-fill\">\n");
    out.push_str(&format!(
        "                        <div class=\"pf-c-card__title pf-m-lg\">{}</div>\n",
        count
    ));
    out.push_str(&format!(
        "                        <small class=\"pf-c-content\">{}</small>\n",
        caption
    ));
    out.push_str("                    </div>\n");
    out.push_str("                </div>\n");
    out
}

fn ticket_row(row: &DisplayRow, summary: &ContributorSummary) -> String {
    let empty = BTreeSet::new();
    let people = summary.get(&row.key).unwrap_or(&empty);
    let indent = if row.depth > 0 {
        format!(
            " margin-left: {}rem; border-left: 3px solid #06c;",
            row.depth as f64 * 1.5
        )
    } else {
        String::new()
    };
    let status_modifier = StatusClass::from_status(&row.status).label_modifier();

    let mut out = String::new();
    out.push_str(&format!(
        "                    <div class=\"pf-c-data-list__item\" style=\"padding: 0.75rem;{}\">\n",
        indent
    ));
    out.push_str("                        <div class=\"pf-c-data-list__item-content\">\n");
    out.push_str("                            <div class=\"pf-c-data-list__item-row\">\n");
    out.push_str(
        "                                <div class=\"pf-c-data-list__item-control\" style=\"display: flex; align-items: center; gap: 0.75rem; flex-wrap: wrap;\">\n",
    );
    out.push_str(&format!(
        "                                    <a href=\"{}\" class=\"pf-c-button pf-m-primary pf-m-small custom-ticket-key\" target=\"_blank\">{}</a>\n",
        html_escape(&row.url),
        html_escape(&row.key)
    ));
    out.push_str(&format!(
        "                                    <span class=\"pf-c-content\" style=\"flex: 1;\">{}</span>\n",
        html_escape(&row.summary)
    ));
    out.push_str(&format!(
        "                                    <span class=\"pf-c-label pf-m-outline\">{}</span>\n",
        html_escape(&row.issue_type)
    ));
    out.push_str(&format!(
        "                                    <span class=\"pf-c-label custom-status {}\">{}</span>\n",
        status_modifier,
        html_escape(&row.status)
    ));
    out.push_str(&format!(
        "                                    <span class=\"pf-c-label pf-m-outline pf-m-compact\">{} contributors</span>\n",
        people.len()
    ));
    out.push_str("                                </div>\n");
    out.push_str("                            </div>\n");

    if !people.is_empty() {
        out.push_str(
            "                            <div class=\"pf-c-data-list__item-row\" style=\"margin-top: 0.5rem;\">\n",
        );
        out.push_str("                                <div class=\"pf-c-data-list__item-control\">\n");
        out.push_str("                                    <strong>Contributors:</strong>\n");
        out.push_str("                                    <div style=\"margin-top: 0.25rem;\">\n");
        for identity in people {
            out.push_str(&format!(
                "                                        <span class=\"pf-c-label pf-m-compact\" style=\"margin-right: 0.25rem; margin-bottom: 0.25rem;\">{}</span>\n",
                html_escape(identity.display())
            ));
        }
        out.push_str("                                    </div>\n");
        out.push_str("                                </div>\n");
        out.push_str("                            </div>\n");
    }

    out.push_str("                        </div>\n");
    out.push_str("                    </div>\n");
    out
}

fn contributor_block(identity: &Identity, tickets: &[&DisplayRow]) -> String {
    let plural = if tickets.len() == 1 { "" } else { "s" };
    let mut out = String::new();
    out.push_str(
        "                    <div class=\"pf-c-data-list__item\" style=\"margin-bottom: 1rem;\">\n",
    );
    out.push_str("                        <div class=\"pf-c-data-list__item-content\">\n");
    out.push_str("                            <div class=\"pf-c-data-list__item-row\">\n");
    out.push_str("                                <div class=\"pf-c-data-list__item-control\">\n");
    out.push_str(&format!(
        "                                    <h3 class=\"pf-c-title pf-m-lg\">{}</h3>\n",
        html_escape(identity.display())
    ));
    out.push_str(&format!(
        "                                    <p class=\"pf-c-content\">Contributing to {} top-level ticket{}</p>\n",
        tickets.len(),
        plural
    ));
    out.push_str("                                </div>\n");
    out.push_str("                            </div>\n");
    for ticket in tickets {
        out.push_str(
            "                            <div class=\"pf-c-data-list__item-row\" style=\"padding: 0.5rem 0;\">\n",
        );
        out.push_str(
            "                                <div class=\"pf-c-data-list__item-control\" style=\"display: flex; align-items: center; gap: 0.75rem;\">\n",
        );
        out.push_str(&format!(
            "                                    <a href=\"{}\" class=\"pf-c-button pf-m-primary pf-m-small custom-ticket-key\" target=\"_blank\">{}</a>\n",
            html_escape(&ticket.url),
            html_escape(&ticket.key)
        ));
        out.push_str(&format!(
            "                                    <span class=\"pf-c-content\">{}</span>\n",
            html_escape(&ticket.summary)
        ));
        out.push_str("                                </div>\n");
        out.push_str("                            </div>\n");
    }
    out.push_str("                        </div>\n");
    out.push_str("                    </div>\n");
    out
}

/// Escape text for HTML element and attribute positions.
fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = r#"    <style>
        /* Custom overrides for PatternFly */
        .custom-header {
            background: linear-gradient(135deg, #e57373 0%, #ad1457 100%);
        }

        .custom-stat-card.pf-m-selectable.pf-m-selected {
            border-color: #d32f2f;
            background-color: #ffebee;
        }

        .custom-stat-card.pf-m-selectable.pf-m-selected .pf-c-card__title {
            color: #c62828;
        }

        .custom-ticket-key {
            background-color: #e57373;
        }

        .custom-ticket-key:hover {
            background-color: #d32f2f;
        }
    </style>
"#;

const SCRIPT: &str = r#"    <script>
        function showTicketsView() {
            document.getElementById('tickets-card').classList.add('pf-m-selected');
            document.getElementById('root-tickets-card').classList.remove('pf-m-selected');
            document.getElementById('contributors-card').classList.remove('pf-m-selected');

            document.querySelector('.tickets-container').style.display = 'block';
            document.getElementById('root-tickets-container').style.display = 'none';
            document.getElementById('contributors-container').style.display = 'none';
        }

        function showRootTicketsView() {
            document.getElementById('root-tickets-card').classList.add('pf-m-selected');
            document.getElementById('tickets-card').classList.remove('pf-m-selected');
            document.getElementById('contributors-card').classList.remove('pf-m-selected');

            document.querySelector('.tickets-container').style.display = 'none';
            document.getElementById('root-tickets-container').style.display = 'block';
            document.getElementById('contributors-container').style.display = 'none';
        }

        function showContributorsView() {
            document.getElementById('contributors-card').classList.add('pf-m-selected');
            document.getElementById('tickets-card').classList.remove('pf-m-selected');
            document.getElementById('root-tickets-card').classList.remove('pf-m-selected');

            document.querySelector('.tickets-container').style.display = 'none';
            document.getElementById('root-tickets-container').style.display = 'none';
            document.getElementById('contributors-container').style.display = 'block';
        }
    </script>
"#;
