//! Error taxonomy with exit-code mapping.
//!
//! `ScraperError` is the library-level error type returned by matchscraper
//! operations. Component crates define their failures as the sub-enums here
//! so that the CLI can map any failure to a documented exit code in one
//! place.
//!
//! # Exit Code Mapping
//!
//! | Exit code | Error |
//! |-----------|-------|
//! | 2 | `Config` |
//! | 3 | `Browser`, `Filter`, `Parse` |
//! | 4 | `State(StateError::Locked)` |
//! | 5 | `Queue(QueueError::Unavailable)` |
//! | 6 | `Audit` |
//! | 130 | `Interrupted` |
//! | 1 | everything else |
//!
//! Library code returns `ScraperError` and does NOT call
//! `std::process::exit()`; only the CLI maps errors to process exit.

use chrono::NaiveDate;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Top-level error type for matchscraper library operations.
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Extraction error: {0}")]
    Parse(#[from] ParseError),

    #[error("State store error: {0}")]
    State(#[from] StateError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run interrupted")]
    Interrupted,
}

impl ScraperError {
    /// Map this error to the documented CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CONFIG,
            Self::Browser(_) | Self::Filter(_) | Self::Parse(_) => ExitCode::SCRAPE,
            Self::State(StateError::Locked { .. }) => ExitCode::STATE_LOCKED,
            Self::Queue(QueueError::Unavailable { .. }) => ExitCode::BROKER_UNAVAILABLE,
            Self::Audit(_) => ExitCode::AUDIT_WRITE,
            Self::Interrupted => ExitCode::INTERRUPTED,
            Self::State(_) | Self::Queue(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

/// Configuration resolution failures. Raised before any I/O happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown division '{0}' (known: {1})")]
    UnknownDivision(String, String),

    #[error("Invalid date range: from {from} is after to {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("Conflicting flags: {first} cannot be combined with {second}")]
    ConflictingFlags { first: String, second: String },

    #[error("Invalid environment variable {var}: {value}")]
    InvalidEnv { var: String, value: String },
}

/// Browser launch, navigation, and action failures.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {reason}")]
    LaunchFailed { reason: String },

    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Schedule iframe not found under main[role=\"main\"]")]
    IframeNotFound,

    #[error("Browser action '{action}' timed out after {timeout_ms}ms")]
    ActionTimeout { action: String, timeout_ms: u64 },

    #[error("WebDriver error: {reason}")]
    Webdriver { reason: String },
}

/// Filter-engine failures inside the schedule iframe.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter '{filter}' unavailable: selector {selector} not found")]
    Unavailable { filter: String, selector: String },

    #[error("Filter '{filter}' rejected value '{requested}' (available: {available})")]
    Rejected {
        filter: String,
        requested: String,
        available: String,
    },

    #[error("Filter '{filter}' did not verify: expected '{expected}', dropdown shows '{actual}'")]
    VerificationFailed {
        filter: String,
        expected: String,
        actual: String,
    },
}

/// Extraction and parsing failures.
///
/// Row-level variants are caught by the extractor, logged at warning level,
/// and counted; `BatchEmpty` is fatal.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unrecognized date format: '{0}'")]
    UnknownDateFormat(String),

    #[error("Unrecognized time format: '{0}'")]
    UnknownTimeFormat(String),

    #[error("Unparseable score cell: '{0}'")]
    InvalidScore(String),

    #[error("Row is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Results container reports {reported} matches but 0 rows were extractable")]
    BatchEmpty { reported: usize },
}

/// Snapshot store and lock failures.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State file locked by another run (PID {pid}, created {created_ago} ago)")]
    Locked { pid: u32, created_ago: String },

    #[error("Corrupt snapshot at {path}: {reason}")]
    CorruptSnapshot { path: String, reason: String },

    #[error("Failed to persist snapshot to {path}: {reason}")]
    PersistFailed { path: String, reason: String },

    #[error("IO error during state operation: {0}")]
    Io(#[from] std::io::Error),
}

/// Broker connection and publish failures.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Broker unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    #[error("Publish failed for match {correlation_id}: {reason}")]
    PublishFailed {
        correlation_id: String,
        reason: String,
    },

    #[error("Message validation failed for match {correlation_id}: {reason}")]
    InvalidMessage {
        correlation_id: String,
        reason: String,
    },
}

/// Audit trail failures. Any append failure is fatal to the run: the audit
/// trail must not be lossy.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to append audit event to {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to read audit file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Invalid audit event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },
}

/// Match-record invariant violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("external_match_id is empty")]
    EmptyExternalId,

    #[error("Match {id}: {side} team name is empty")]
    EmptyTeam { id: String, side: &'static str },

    #[error("Match {id}: status is completed but scores are missing")]
    CompletedWithoutScores { id: String },

    #[error("Match {id}: scores present but status is {status}")]
    ScoresWithoutCompleted { id: String, status: String },

    #[error("Match {id}: date {date} outside scraped range {from}..={to}")]
    DateOutOfRange {
        id: String,
        date: NaiveDate,
        from: NaiveDate,
        to: NaiveDate,
    },
}
