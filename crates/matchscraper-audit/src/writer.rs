//! Append-only JSONL writer with per-UTC-day files.

use std::fs::{File, OpenOptions};
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use matchscraper_utils::error::AuditError;
use matchscraper_utils::paths;
use tracing::trace;

use crate::events::AuditEvent;

/// Serializes events to `<audit-dir>/match-audit-YYYY-MM-DD.jsonl`.
///
/// The file for the event's UTC day is opened in append mode and the line
/// is flushed immediately; rotation is purely by file name. Events are kept
/// well under one page so concurrent same-day runs interleave at line
/// boundaries via OS append atomicity.
pub struct AuditWriter {
    audit_dir: Utf8PathBuf,
    open: Option<(NaiveDate, File)>,
}

impl AuditWriter {
    #[must_use]
    pub fn new(audit_dir: &Utf8Path) -> Self {
        Self {
            audit_dir: audit_dir.to_owned(),
            open: None,
        }
    }

    /// Append one event. Any failure here is fatal to the run: the audit
    /// trail must not be lossy.
    pub fn append(&mut self, event: &AuditEvent) -> Result<(), AuditError> {
        let day = event.timestamp().date_naive();
        let path = paths::audit_file_for(&self.audit_dir, day);

        let line = serde_json::to_string(event).map_err(|e| AuditError::WriteFailed {
            path: path.to_string(),
            reason: format!("serialization failed: {e}"),
        })?;

        let file = self.file_for(day, &path)?;
        writeln!(file, "{line}").map_err(|e| AuditError::WriteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        file.flush().map_err(|e| AuditError::WriteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        trace!(event_type = event.event_type(), path = %path, "audit event appended");
        Ok(())
    }

    /// The open handle for `day`, rolling to a new file when the UTC day
    /// has changed since the last append.
    fn file_for(&mut self, day: NaiveDate, path: &Utf8Path) -> Result<&mut File, AuditError> {
        let reopen = !matches!(&self.open, Some((open_day, _)) if *open_day == day);
        if reopen {
            paths::ensure_dir_all(&self.audit_dir).map_err(|e| AuditError::WriteFailed {
                path: path.to_string(),
                reason: format!("cannot create audit directory: {e}"),
            })?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path.as_std_path())
                .map_err(|e| AuditError::WriteFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
            self.open = Some((day, file));
        }
        let Some((_, file)) = self.open.as_mut() else {
            return Err(AuditError::WriteFailed {
                path: path.to_string(),
                reason: "audit file handle unavailable".to_string(),
            });
        };
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RunMetadata, RunSummary};
    use chrono::{TimeZone, Utc};
    use matchscraper_utils::types::{AgeGroup, League};
    use tempfile::TempDir;

    fn metadata() -> RunMetadata {
        RunMetadata {
            league: League::Homegrown,
            age_group: AgeGroup::U14,
            division: "Northeast".to_string(),
            date_range: "2025-09-12 to 2025-09-19".to_string(),
        }
    }

    fn started(ts: chrono::DateTime<Utc>, run_id: &str) -> AuditEvent {
        AuditEvent::RunStarted {
            timestamp: ts,
            run_id: run_id.to_string(),
            run_metadata: metadata(),
        }
    }

    #[test]
    fn appends_one_json_object_per_line() {
        let dir = TempDir::new().unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut writer = AuditWriter::new(&audit_dir);

        let ts = Utc.with_ymd_and_hms(2025, 9, 12, 6, 0, 0).unwrap();
        writer.append(&started(ts, "run-1")).unwrap();
        writer
            .append(&AuditEvent::RunCompleted {
                timestamp: ts,
                run_id: "run-1".to_string(),
                run_metadata: metadata(),
                summary: RunSummary::default(),
                success: true,
            })
            .unwrap();

        let content =
            std::fs::read_to_string(dir.path().join("match-audit-2025-09-12.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["event_type"].is_string());
        }
    }

    #[test]
    fn day_rollover_starts_a_new_file() {
        let dir = TempDir::new().unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut writer = AuditWriter::new(&audit_dir);

        let before_midnight = Utc.with_ymd_and_hms(2025, 9, 12, 23, 59, 58).unwrap();
        let after_midnight = Utc.with_ymd_and_hms(2025, 9, 13, 0, 0, 2).unwrap();
        writer.append(&started(before_midnight, "run-1")).unwrap();
        writer.append(&started(after_midnight, "run-2")).unwrap();

        assert!(dir.path().join("match-audit-2025-09-12.jsonl").exists());
        assert!(dir.path().join("match-audit-2025-09-13.jsonl").exists());
    }

    #[test]
    fn appends_to_an_existing_file() {
        let dir = TempDir::new().unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let ts = Utc.with_ymd_and_hms(2025, 9, 12, 6, 0, 0).unwrap();

        {
            let mut writer = AuditWriter::new(&audit_dir);
            writer.append(&started(ts, "run-1")).unwrap();
        }
        {
            let mut writer = AuditWriter::new(&audit_dir);
            writer.append(&started(ts, "run-2")).unwrap();
        }

        let content =
            std::fs::read_to_string(dir.path().join("match-audit-2025-09-12.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn write_failure_reports_the_path() {
        // Point the writer at a path that cannot be a directory.
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(blocker).unwrap();
        let mut writer = AuditWriter::new(&audit_dir);

        let ts = Utc.with_ymd_and_hms(2025, 9, 12, 6, 0, 0).unwrap();
        let err = writer.append(&started(ts, "run-1")).unwrap_err();
        assert!(err.to_string().contains("match-audit-2025-09-12.jsonl"));
    }
}
