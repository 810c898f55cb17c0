//! matchscraper-audit - the JSONL audit trail
//!
//! One JSON object per line, one file per UTC day, append-only, flushed
//! per event. The writer never filters: `match_unchanged` events are
//! emitted like every other kind, and suppression is the viewer's job
//! (`audit view --changes-only`).

mod events;
mod view;
mod writer;

pub use events::{AuditEvent, RunMetadata, RunSummary};
pub use view::{DayStats, ViewFilter, day_stats, filter_events, read_events, render_text};
pub use writer::AuditWriter;
