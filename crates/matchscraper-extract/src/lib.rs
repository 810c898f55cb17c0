//! matchscraper-extract - row/card extraction and parsing
//!
//! Turns the raw records read from the results container into normalized
//! [`Match`](matchscraper_utils::Match) values. A single unparseable row is
//! logged and skipped; an entire batch yielding nothing while the container
//! reports matches fails the run.

mod extract;
mod normalize;
mod parse;

pub use extract::{ExtractionContext, ExtractionReport, Extractor};
pub use normalize::TeamNameNormalizer;
pub use parse::{parse_match_date, parse_match_time};
