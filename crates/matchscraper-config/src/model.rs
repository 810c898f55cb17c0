//! Configuration types: raw CLI input, resolved config, source attribution.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use matchscraper_utils::types::{AgeGroup, League};

/// Raw `scrape` arguments as parsed by clap, before resolution.
///
/// `None` means the flag was not given; resolution falls through to the
/// environment and then to the built-in default.
#[derive(Debug, Clone, Default)]
pub struct ScrapeArgs {
    pub league: Option<League>,
    pub age_group: Option<AgeGroup>,
    pub division: Option<String>,
    pub club: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub start_offset: Option<i64>,
    pub end_offset: Option<i64>,
    pub queue: Option<String>,
    pub exchange: Option<String>,
    pub no_submit_queue: bool,
    pub broker_url: Option<String>,
    pub headless: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub slow_ms: Option<u64>,
    pub audit_dir: Option<Utf8PathBuf>,
    pub state_file: Option<Utf8PathBuf>,
    pub force: bool,
    pub verbose: bool,
}

/// Which layer supplied a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Default => "default",
        }
    }
}

/// Resolved inclusive scrape window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Human-readable label used in `run_metadata`: `YYYY-MM-DD to YYYY-MM-DD`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        )
    }

    /// Whether the range spans more than one calendar month. Drives the
    /// two-pane calendar path in the filter engine.
    #[must_use]
    pub fn crosses_month(&self) -> bool {
        use chrono::Datelike;
        (self.from.year(), self.from.month()) != (self.to.year(), self.to.month())
    }
}

/// Broker routing target. Exactly one of fanout or direct queue, or
/// publishing disabled entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    /// Publish to a fanout exchange with an empty routing key; the broker
    /// duplicates to all bound queues.
    Fanout { exchange: String },
    /// Publish with the empty (default) exchange and the queue name as
    /// routing key.
    DirectQueue { queue: String },
    /// `--no-submit-queue`: scrape and audit only.
    Disabled,
}

/// Immutable resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub league: League,
    pub age_group: AgeGroup,
    pub division: String,
    pub club: Option<String>,
    pub date_range: DateRange,
    pub season: String,
    pub routing: Routing,
    pub broker_url: Option<String>,
    pub headless: bool,
    pub action_timeout_ms: u64,
    pub slow_motion_ms: u64,
    pub audit_dir: Utf8PathBuf,
    pub state_file: Utf8PathBuf,
    pub log_level: Option<String>,
    /// Override a state lock whose owning process is gone.
    pub force_lock: bool,
    pub verbose: bool,
    pub(crate) sources: HashMap<&'static str, ConfigSource>,
}

impl Config {
    /// Which layer supplied the value for `key`, for operator debugging.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.sources.get(key).copied().unwrap_or(ConfigSource::Default)
    }

    /// Effective configuration as `(key, value, source)` rows. Logged at
    /// debug level on startup.
    #[must_use]
    pub fn effective(&self) -> Vec<(&'static str, String, &'static str)> {
        let mut rows = vec![
            ("league", self.league.to_string(), self.source_of("league")),
            (
                "age_group",
                self.age_group.to_string(),
                self.source_of("age_group"),
            ),
            ("division", self.division.clone(), self.source_of("division")),
            (
                "date_range",
                self.date_range.label(),
                self.source_of("date_range"),
            ),
            (
                "routing",
                match &self.routing {
                    Routing::Fanout { exchange } => format!("fanout:{exchange}"),
                    Routing::DirectQueue { queue } => format!("queue:{queue}"),
                    Routing::Disabled => "disabled".to_string(),
                },
                self.source_of("routing"),
            ),
            ("headless", self.headless.to_string(), self.source_of("headless")),
            (
                "action_timeout_ms",
                self.action_timeout_ms.to_string(),
                self.source_of("action_timeout_ms"),
            ),
            (
                "audit_dir",
                self.audit_dir.to_string(),
                self.source_of("audit_dir"),
            ),
            (
                "state_file",
                self.state_file.to_string(),
                self.source_of("state_file"),
            ),
        ];
        if let Some(club) = &self.club {
            rows.push(("club", club.clone(), self.source_of("club")));
        }
        rows.into_iter()
            .map(|(k, v, s)| (k, v, s.label()))
            .collect()
    }

    /// Whether queue publishing is enabled for this run.
    #[must_use]
    pub fn submit_enabled(&self) -> bool {
        !matches!(self.routing, Routing::Disabled)
    }
}
