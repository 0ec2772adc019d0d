//! Structured output formatting for CLI commands.
//!
//! This module provides consistent JSON output formatting for both success
//! and error cases, ensuring machine-readable output that works well with
//! scripts and automation tools.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::Display;
use std::io::{self, Write};

/// Version of the JSON output format
const OUTPUT_VERSION: &str = "0.1.0";

// ============================================================================
// Output Context for Quiet and Verbose Modes
// ============================================================================

/// Context for controlling output verbosity
pub struct OutputContext {
    quiet: bool,
    verbose: bool,
    json: bool,
}

impl OutputContext {
    /// Create a new output context
    pub fn new(quiet: bool, verbose: bool, json: bool) -> Self {
        Self {
            quiet,
            verbose,
            json,
        }
    }

    /// Print essential output (always shown unless --json)
    pub fn print_data(&self, msg: impl Display) -> io::Result<()> {
        if !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print informational message (suppressed by --quiet or --json)
    pub fn print_info(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print success message (suppressed by --quiet or --json)
    pub fn print_success(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print warning to stderr (suppressed by --quiet or --json)
    pub fn print_warning(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe_stderr(&format!("Warning: {}", msg))
        } else {
            Ok(())
        }
    }

    /// Print per-item detail to stderr (shown only with --verbose)
    pub fn print_verbose(&self, msg: impl Display) -> io::Result<()> {
        if self.verbose && !self.quiet && !self.json {
            writeln_safe_stderr(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print error (always shown to stderr)
    pub fn print_error(&self, msg: impl Display) -> io::Result<()> {
        writeln_safe_stderr(&format!("Error: {}", msg))
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if JSON mode is enabled
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Safe println that handles broken pipes gracefully
fn writeln_safe(msg: &str) -> io::Result<()> {
    match writeln!(io::stdout(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Silently exit on broken pipe (expected when piping to head, etc.)
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

/// Safe eprintln that handles broken pipes gracefully
fn writeln_safe_stderr(msg: &str) -> io::Result<()> {
    match writeln!(io::stderr(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Silently exit on broken pipe
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// JSON Output Types
// ============================================================================

/// Wrapper for successful command output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

impl<T: Serialize> JsonOutput<T> {
    /// Create a new successful output with the given data
    pub fn success(data: T, command: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata::new(command),
        }
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrapper for error output with suggestions
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
    pub metadata: Metadata,
}

impl JsonError {
    /// Create a new error output
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
                suggestions: Vec::new(),
            },
            metadata: Metadata::new(command),
        }
    }

    /// Add details to the error
    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Add a suggestion to the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error.suggestions.push(suggestion.into());
        self
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ErrorCode::to_exit_code(&self.error.code)
    }
}

/// Error details including code, message, and suggestions
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code (e.g., "TICKET_NOT_FOUND", "AUTH_FAILED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Suggested actions to resolve the error
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

// ============================================================================
// Exit Codes
// ============================================================================

/// Standardized exit codes for the jcs CLI
///
/// These codes follow Unix conventions and provide consistent error reporting
/// for automation and scripting.
///
/// # Examples
///
/// ```rust
/// use jcs::ExitCode;
///
/// // Success case
/// std::process::exit(ExitCode::Success.code());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded (0)
    Success = 0,

    /// Generic error (1)
    GenericError = 1,

    /// Invalid arguments or usage error (2)
    InvalidArgument = 2,

    /// Resource not found - ticket, cache entry, etc. (3)
    NotFound = 3,

    /// Authentication with the ticket source failed (5)
    PermissionDenied = 5,

    /// External dependency failed - JIRA, cache, file system (10)
    ExternalError = 10,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get a description of what this exit code means
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Command succeeded",
            ExitCode::GenericError => "Generic error occurred",
            ExitCode::InvalidArgument => "Invalid arguments or usage error",
            ExitCode::NotFound => "Resource not found (ticket, cache entry, etc.)",
            ExitCode::PermissionDenied => "Authentication with the ticket source failed",
            ExitCode::ExternalError => "External dependency failed (JIRA, cache, file system)",
        }
    }
}

// ============================================================================
// Error Codes (String constants for JSON responses)
// ============================================================================

/// Standard error codes for jcs operations (JSON format)
pub struct ErrorCode;

impl ErrorCode {
    pub const TICKET_NOT_FOUND: &'static str = "TICKET_NOT_FOUND";
    pub const AUTH_FAILED: &'static str = "AUTH_FAILED";
    pub const SOURCE_UNAVAILABLE: &'static str = "SOURCE_UNAVAILABLE";
    pub const MALFORMED_RESPONSE: &'static str = "MALFORMED_RESPONSE";
    pub const CACHE_IO: &'static str = "CACHE_IO";
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";
    pub const IO_ERROR: &'static str = "IO_ERROR";
}

impl ErrorCode {
    /// Map error code string to exit code
    pub fn to_exit_code(code: &str) -> ExitCode {
        match code {
            Self::TICKET_NOT_FOUND => ExitCode::NotFound,
            Self::AUTH_FAILED => ExitCode::PermissionDenied,
            Self::SOURCE_UNAVAILABLE | Self::MALFORMED_RESPONSE => ExitCode::ExternalError,
            Self::CACHE_IO | Self::IO_ERROR => ExitCode::ExternalError,
            Self::INVALID_ARGUMENT => ExitCode::InvalidArgument,
            _ => ExitCode::GenericError,
        }
    }
}

/// Helpers to create common error responses
impl JsonError {
    pub fn ticket_not_found(key: &str, command: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TICKET_NOT_FOUND,
            format!("Ticket not found: {}", key),
            command,
        )
        .with_details(serde_json::json!({"ticket_key": key}))
        .with_suggestion("Check that the ticket key is correct")
        .with_suggestion("Verify --jira-url points at the right instance")
    }

    pub fn auth_failed(detail: &str, command: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AUTH_FAILED,
            format!("Authentication with the ticket source failed: {}", detail),
            command,
        )
        .with_suggestion("Set JIRA_API_TOKEN to a valid API token")
        .with_suggestion("For JIRA Cloud, also set JIRA_EMAIL for Basic auth")
    }
}

/// Metadata included in all responses
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// Timestamp when the response was generated
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: chrono::DateTime<Utc>,
    /// Version of the output format
    pub version: String,
    /// Command that generated this response
    pub command: String,
}

impl Metadata {
    fn new(command: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            version: OUTPUT_VERSION.to_string(),
            command: command.into(),
        }
    }
}

/// Serialize timestamp in ISO 8601 format
fn serialize_timestamp<S>(dt: &chrono::DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// Command Response Types
// ============================================================================

/// Response for `generate --json`
#[derive(Debug, Serialize, JsonSchema)]
pub struct GenerateResponse {
    /// Project key the report covers
    pub project: String,
    /// Path the report was written to
    pub output: String,
    /// Tickets rendered into the report
    pub tickets: usize,
    /// Hierarchy roots among them
    pub root_tickets: usize,
    /// Distinct contributors across all tickets
    pub contributors: usize,
    /// Tickets fetched from the source this run
    pub source_fetches: usize,
    /// Tickets served from the local cache
    pub cache_hits: usize,
    /// Non-fatal problems encountered while building the hierarchy
    pub warnings: Vec<String>,
}
