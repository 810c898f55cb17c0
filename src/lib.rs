//! matchscraper - browser-driven MLS Next match pipeline
//!
//! Scrapes youth match listings from the upstream schedule UI, reconciles
//! them against the prior run's snapshot, appends a JSONL audit trail, and
//! publishes discovered/updated matches to an AMQP broker. Consumers drain
//! the broker and write the database; this crate never touches one.

pub mod cli;

// Stable re-exports for library consumers and the integration tests.
pub use matchscraper_audit::{
    AuditEvent, AuditWriter, DayStats, RunMetadata, RunSummary, ViewFilter, day_stats,
    filter_events, read_events, render_text,
};
pub use matchscraper_browser::{BrowserPage, BrowserSession, RawMatchRecord, ResultsLayout,
    ResultsSnapshot};
pub use matchscraper_config::{Config, DateRange, EnvConfig, Routing, ScrapeArgs};
pub use matchscraper_extract::{ExtractionContext, Extractor, TeamNameNormalizer};
pub use matchscraper_filters::{FilterEngine, FilterPlan, FilterState};
pub use matchscraper_orchestrator::{Context, InterruptFlag, RunReport, run_scrape};
pub use matchscraper_queue::{AmqpPublisher, SubmitResult, Submitter, TASK_NAME};
pub use matchscraper_state::{ChangeSet, DetectionOutcome, StateStore, detect_changes};
pub use matchscraper_utils::{
    AgeGroup, Clock, ExitCode, IdGen, League, Match, MatchStatus, ScraperError,
};
