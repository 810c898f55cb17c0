//! matchscraper-filters - filter application inside the schedule iframe
//!
//! Applies the configured league filters against the upstream UI's custom
//! dropdowns and date-range calendar, in the order the UI's dependency
//! graph requires: age group, then division, then club, then dates.
//! Changing the age group can rewrite the club list, so the order is not
//! negotiable.
//!
//! Each filter walks the same state machine:
//!
//! ```text
//! Idle -> Opening -> Selecting -> Applied -> Verified
//! ```
//!
//! Verification reads the dropdown's visible label back; a dropdown that
//! does not offer the requested value fails loudly with
//! [`FilterError::Rejected`](matchscraper_utils::error::FilterError) rather
//! than silently scraping the wrong slice.

mod calendar;
mod engine;
mod settle;

pub use engine::{FilterEngine, FilterPlan, FilterState};
pub use settle::wait_for_settle;
