//! Command-line interface definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// JIRA Contributor Summary
///
/// Builds a static HTML report of who contributes where in a JIRA project's
/// ticket hierarchy. Tickets are cached locally so repeat runs only refetch
/// what changed upstream.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments or usage error
///   3  - Resource not found (ticket, cache entry, etc.)
///   5  - Authentication with the ticket source failed
///  10  - External dependency failed (JIRA, cache, file system)
#[derive(Parser)]
#[command(name = "jcs")]
#[command(about = "JIRA contributor summary reports", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show per-ticket detail while building the hierarchy
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the contributor summary report
    ///
    /// Either --project (report on every unresolved root ticket of the
    /// project) or --ticket (report on a single subtree) must be given.
    /// Credentials come from --token/--email or the JIRA_API_TOKEN and
    /// JIRA_EMAIL environment variables, never from the config file.
    Generate {
        /// Base URL of the JIRA instance (e.g. https://jira.example.com)
        #[arg(long)]
        jira_url: Option<String>,

        /// Project key to report on (e.g. PROJ)
        #[arg(short, long)]
        project: Option<String>,

        /// Single root ticket key to report on instead of a whole project
        #[arg(short, long)]
        ticket: Option<String>,

        /// Report output path (default: jira-contributor-summary.html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Issue types treated as hierarchy roots (default: Feature,Issue,Bug)
        #[arg(long, value_delimiter = ',')]
        issue_types: Option<Vec<String>>,

        /// API token (default: JIRA_API_TOKEN environment variable)
        #[arg(long)]
        token: Option<String>,

        /// Account email for Basic auth (default: JIRA_EMAIL environment variable)
        #[arg(long)]
        email: Option<String>,

        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Custom field id holding additional assignees (e.g. customfield_10100)
        #[arg(long)]
        additional_assignees_field: Option<String>,

        /// Custom field id holding contributors (e.g. customfield_10101)
        #[arg(long)]
        contributors_field: Option<String>,

        /// Drop the ticket cache before generating
        #[arg(long)]
        clear_cache: bool,

        /// Output a JSON summary instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Remove all cached tickets
    ClearCache {
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Show cache location, entry count, and size
    CacheInfo {
        /// Cache directory override
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_parses_all_flags() {
        let cli = Cli::parse_from([
            "jcs",
            "generate",
            "--jira-url",
            "https://jira.example.com",
            "--project",
            "PROJ",
            "--issue-types",
            "Feature,Bug",
            "--output",
            "out.html",
            "--clear-cache",
        ]);

        assert!(!cli.quiet);
        match cli.command {
            Some(Commands::Generate {
                jira_url,
                project,
                ticket,
                output,
                issue_types,
                clear_cache,
                json,
                ..
            }) => {
                assert_eq!(jira_url.as_deref(), Some("https://jira.example.com"));
                assert_eq!(project.as_deref(), Some("PROJ"));
                assert!(ticket.is_none());
                assert_eq!(output, Some(PathBuf::from("out.html")));
                assert_eq!(
                    issue_types,
                    Some(vec!["Feature".to_string(), "Bug".to_string()])
                );
                assert!(clear_cache);
                assert!(!json);
            }
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn test_single_ticket_mode() {
        let cli = Cli::parse_from(["jcs", "generate", "--ticket", "PROJ-42"]);
        match cli.command {
            Some(Commands::Generate {
                project, ticket, ..
            }) => {
                assert!(project.is_none());
                assert_eq!(ticket.as_deref(), Some("PROJ-42"));
            }
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["jcs", "cache-info", "--quiet", "--verbose"]);
        assert!(cli.quiet);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::CacheInfo { .. })));
    }

    #[test]
    fn test_clear_cache_with_dir() {
        let cli = Cli::parse_from(["jcs", "clear-cache", "--cache-dir", "/tmp/jcs-cache"]);
        match cli.command {
            Some(Commands::ClearCache { cache_dir }) => {
                assert_eq!(cache_dir, Some(PathBuf::from("/tmp/jcs-cache")));
            }
            _ => panic!("expected clear-cache subcommand"),
        }
    }

    #[test]
    fn test_no_subcommand_is_allowed_at_parse_time() {
        // The binary reports the missing command itself, not clap
        let cli = Cli::parse_from(["jcs"]);
        assert!(cli.command.is_none());
    }
}
