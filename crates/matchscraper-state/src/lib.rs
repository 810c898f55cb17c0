//! matchscraper-state - snapshot store and change detection
//!
//! The snapshot is a single JSON file mapping `external_match_id` to the
//! last-emitted [`Match`](matchscraper_utils::Match). Exactly one run may
//! hold it open for writing; a sidecar lock file with the owner's PID
//! enforces that. The snapshot is rewritten atomically, and only after the
//! rest of the pipeline has succeeded.

mod detect;
mod store;

pub use detect::{ChangeSet, DetectionOutcome, FieldChange, detect_changes};
pub use store::{LockInfo, Snapshot, StateStore};
