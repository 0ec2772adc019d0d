//! JIRA Contributor Summary
//!
//! Builds a static HTML report of who contributes where in a JIRA project's
//! ticket hierarchy. Tickets are cached locally with modification-aware
//! staleness so repeat runs only refetch what changed upstream.
//!
//! # Features
//!
//! - Hierarchy traversal across epic/feature parent links
//! - Local ticket cache keyed on upstream modification timestamps
//! - Bottom-up contributor aggregation per subtree
//! - Self-contained PatternFly-styled HTML report

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use jcs::cache::{JsonFileCache, TicketStore};
use jcs::cli::{Cli, Commands};
use jcs::config::JcsConfig;
use jcs::contributors;
use jcs::errors::{CacheError, SourceError};
use jcs::fields::FieldMap;
use jcs::output::{ErrorCode, ExitCode, GenerateResponse, JsonError, JsonOutput, OutputContext};
use jcs::report;
use jcs::source::{Credentials, JiraSource};
use jcs::HierarchyBuilder;
use std::env;
use std::path::PathBuf;

const DEFAULT_OUTPUT: &str = "jira-contributor-summary.html";
const DEFAULT_ROOT_TYPES: [&str; 3] = ["Feature", "Issue", "Bug"];

/// Helper to determine exit code from error
fn error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    // Check typed errors first
    if let Some(source_error) = error.downcast_ref::<SourceError>() {
        return match source_error {
            SourceError::Auth(_) => ExitCode::PermissionDenied,
            SourceError::NotFound(_) => ExitCode::NotFound,
            SourceError::Transient(_) | SourceError::Malformed(_) => ExitCode::ExternalError,
        };
    }
    if error.downcast_ref::<CacheError>().is_some() {
        return ExitCode::ExternalError;
    }
    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ExitCode::NotFound,
            std::io::ErrorKind::PermissionDenied => ExitCode::PermissionDenied,
            _ => ExitCode::ExternalError,
        };
    }

    // Fall back to error message patterns
    let error_msg = error.to_string().to_lowercase();
    if error_msg.contains("not found") || error_msg.contains("no such file") {
        ExitCode::NotFound
    } else if error_msg.contains("missing") || error_msg.contains("invalid") {
        ExitCode::InvalidArgument
    } else if error_msg.contains("failed to read") || error_msg.contains("failed to write") {
        ExitCode::ExternalError
    } else {
        ExitCode::GenericError
    }
}

fn main() {
    let exit_code = match run() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;
    let verbose = cli.verbose;

    let command = cli
        .command
        .ok_or_else(|| anyhow!("No command provided. Use --help for usage."))?;

    let config = JcsConfig::load(&JcsConfig::default_dir())?;

    match command {
        Commands::Generate {
            jira_url,
            project,
            ticket,
            output,
            issue_types,
            token,
            email,
            cache_dir,
            additional_assignees_field,
            contributors_field,
            clear_cache,
            json,
        } => {
            let output_ctx = OutputContext::new(quiet, verbose, json);

            let jira_url = jira_url.or(config.jira_url).ok_or_else(|| {
                anyhow!("Missing JIRA base URL: pass --jira-url or set jira_url in config.toml")
            })?;

            // --ticket wins over --project, with a warning when both are given
            if ticket.is_some() && project.is_some() {
                let _ =
                    output_ctx.print_warning("Both --ticket and --project given; using --ticket");
            }
            let project = project.or(config.project);

            let token = token
                .or_else(|| env::var("JIRA_API_TOKEN").ok())
                .ok_or_else(|| anyhow!("Missing API token: pass --token or set JIRA_API_TOKEN"))?;
            let email = email.or_else(|| env::var("JIRA_EMAIL").ok());

            let mut credentials = Credentials::new(token);
            if let Some(email) = email {
                credentials = credentials.with_email(email);
            }

            let mut field_map = FieldMap::default();
            if let Some(id) = additional_assignees_field {
                field_map = field_map.with_additional_assignees(id);
            }
            if let Some(id) = contributors_field {
                field_map = field_map.with_contributors(id);
            }

            let cache_root = cache_dir
                .or(config.cache_dir)
                .unwrap_or_else(JsonFileCache::default_root);
            let store = JsonFileCache::new(&cache_root);

            if clear_cache {
                store.clear()?;
                let _ = output_ctx.print_info("Cleared ticket cache");
            }

            let source = JiraSource::new(&jira_url, &credentials, field_map);
            let builder = HierarchyBuilder::new(source, store);

            let root_types: Vec<String> = issue_types
                .or(config.issue_types)
                .unwrap_or_else(|| DEFAULT_ROOT_TYPES.iter().map(|s| s.to_string()).collect());

            let project_key;
            let build_result = if let Some(key) = ticket.as_deref() {
                project_key = key
                    .rsplit_once('-')
                    .map_or(key, |(prefix, _)| prefix)
                    .to_string();
                let _ = output_ctx.print_info(format!("Building hierarchy from ticket {}", key));
                builder.build_from_ticket(key)
            } else if let Some(project) = project.as_deref() {
                project_key = project.to_string();
                let _ =
                    output_ctx.print_info(format!("Building hierarchy for project {}", project));
                builder.build(project, &root_types)
            } else {
                return Err(anyhow!(
                    "Missing --project or --ticket: pass one or set project in config.toml"
                ));
            };

            let outcome = match build_result {
                Ok(outcome) => outcome,
                Err(e) => {
                    if json {
                        let json_error = match &e {
                            SourceError::Auth(detail) => JsonError::auth_failed(detail, "generate"),
                            SourceError::NotFound(key) => {
                                JsonError::ticket_not_found(key, "generate")
                            }
                            SourceError::Transient(detail) => {
                                JsonError::new(ErrorCode::SOURCE_UNAVAILABLE, detail, "generate")
                            }
                            SourceError::Malformed(detail) => {
                                JsonError::new(ErrorCode::MALFORMED_RESPONSE, detail, "generate")
                            }
                        };
                        println!("{}", json_error.to_json_string()?);
                        std::process::exit(json_error.exit_code().code());
                    } else {
                        return Err(e.into());
                    }
                }
            };

            if verbose {
                for diagnostic in &outcome.diagnostics {
                    let _ = output_ctx.print_verbose(diagnostic.describe());
                }
            } else if !outcome.diagnostics.is_empty() {
                let _ = output_ctx.print_warning(format!(
                    "{} ticket(s) skipped or degraded while building the hierarchy (rerun with --verbose for detail)",
                    outcome.diagnostics.len()
                ));
            }

            let _ = output_ctx.print_info(format!(
                "Hierarchy has {} ticket(s): {} fetched, {} from cache",
                outcome.stats.tickets, outcome.stats.source_fetches, outcome.stats.cache_hits
            ));

            let rows = outcome.display_rows(&jira_url);
            let _ = output_ctx.print_info("Aggregating contributors");
            let summary = contributors::summarize(&outcome.forest, &outcome.tickets);
            let unique = contributors::unique_contributors(&outcome.tickets);
            let _ = output_ctx.print_info(format!(
                "Found {} unique contributor(s)",
                unique.len()
            ));

            let _ = output_ctx.print_info(format!("Rendering report for {}", project_key));
            let html = report::render(&rows, &summary, &project_key, Utc::now());

            let output_path = output
                .or(config.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
            std::fs::write(&output_path, html)
                .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
            let display_path = output_path
                .canonicalize()
                .unwrap_or_else(|_| output_path.clone());

            if json {
                let response = GenerateResponse {
                    project: project_key,
                    output: display_path.display().to_string(),
                    tickets: rows.len(),
                    root_tickets: rows.iter().filter(|row| row.depth == 0).count(),
                    contributors: unique.len(),
                    source_fetches: outcome.stats.source_fetches,
                    cache_hits: outcome.stats.cache_hits,
                    warnings: outcome
                        .diagnostics
                        .iter()
                        .map(|diagnostic| diagnostic.describe())
                        .collect(),
                };
                let output = JsonOutput::success(response, "generate");
                println!("{}", output.to_json_string()?);
            } else if quiet {
                // In quiet mode, output just the report path for scripting
                println!("{}", display_path.display());
            } else {
                let _ = output_ctx
                    .print_success(format!("Report generated: {}", display_path.display()));
            }
        }
        Commands::ClearCache { cache_dir } => {
            let output_ctx = OutputContext::new(quiet, verbose, false);
            let cache_root = cache_dir
                .or(config.cache_dir)
                .unwrap_or_else(JsonFileCache::default_root);
            let store = JsonFileCache::new(&cache_root);
            store.clear()?;
            let _ = output_ctx
                .print_success(format!("Cleared ticket cache at {}", cache_root.display()));
        }
        Commands::CacheInfo { cache_dir, json } => {
            let cache_root = cache_dir
                .or(config.cache_dir)
                .unwrap_or_else(JsonFileCache::default_root);
            let store = JsonFileCache::new(&cache_root);

            match store.info() {
                Ok(info) => {
                    if json {
                        let output = JsonOutput::success(info, "cache info");
                        println!("{}", output.to_json_string()?);
                    } else {
                        println!("Location: {}", info.location);
                        println!("Entries: {}", info.entry_count);
                        println!("Size: {} bytes", info.total_size_bytes);
                    }
                }
                Err(e) => {
                    if json {
                        let json_error =
                            JsonError::new(ErrorCode::CACHE_IO, e.to_string(), "cache info");
                        println!("{}", json_error.to_json_string()?);
                        std::process::exit(json_error.exit_code().code());
                    } else {
                        return Err(e.into());
                    }
                }
            }
        }
    }

    Ok(())
}
