//! matchscraper-utils - shared model and infrastructure
//!
//! This crate carries everything the other matchscraper crates agree on:
//! the normalized [`Match`](types::Match) record and its enumerations, the
//! error taxonomy with exit-code mapping, atomic file writes, tracing
//! initialization, path resolution, and the injectable [`Clock`](clock::Clock)
//! and [`IdGen`](clock::IdGen) capabilities used for deterministic tests.

pub mod atomic_write;
pub mod clock;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod paths;
pub mod types;

pub use clock::{Clock, IdGen, RandomIdGen, SystemClock, new_run_id};
pub use error::{
    AuditError, BrowserError, ConfigError, FilterError, ParseError, QueueError, ScraperError,
    StateError, ValidationError,
};
pub use exit_codes::ExitCode;
pub use types::{AgeGroup, League, Match, MatchStatus};
