//! matchscraper-orchestrator - the scrape pipeline
//!
//! Composes the capabilities into one run:
//!
//! ```text
//! config -> run_started -> broker check -> state lock -> scrape
//!        -> change detection -> match events -> publish -> persist
//!        -> run_completed -> summary
//! ```
//!
//! Partial-failure rules: extraction failures are fatal, individual
//! queue-publish failures are counted, audit-write failures are fatal.
//! Every failure after `run_started` still produces a `run_completed`
//! with `success=false`, unless the audit layer itself is what failed.

mod context;
mod pipeline;

pub use context::{Context, InterruptFlag};
pub use pipeline::{RunReport, run_scrape};
