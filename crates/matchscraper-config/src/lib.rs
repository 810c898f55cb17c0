//! matchscraper-config - configuration resolution
//!
//! Merges three sources with strict precedence (CLI flags > environment
//! variables > built-in defaults) into an immutable [`Config`], validating
//! enumerations and the requested date range up front. Resolution performs
//! no I/O beyond reading the process environment; every failure is a
//! [`ConfigError`](matchscraper_utils::ConfigError) and maps to exit code 2.

mod env;
mod model;
mod resolve;

pub use env::EnvConfig;
pub use model::{Config, ConfigSource, DateRange, Routing, ScrapeArgs};
