//! Audit trail reading, filtering, and per-day statistics.

use std::collections::BTreeSet;
use std::fs;

use camino::Utf8Path;
use chrono::NaiveDate;
use matchscraper_utils::error::AuditError;
use matchscraper_utils::paths;
use matchscraper_utils::types::League;
use serde::Serialize;

use crate::events::AuditEvent;

/// Filters for `audit view`. All criteria are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub league: Option<League>,
    pub event_type: Option<String>,
    pub match_id: Option<String>,
    pub run_id: Option<String>,
    /// Drop `match_unchanged` events, which dominate steady-state volume.
    pub changes_only: bool,
}

/// Read every event in the audit file for `day`. A missing file is an
/// empty day, not an error.
pub fn read_events(audit_dir: &Utf8Path, day: NaiveDate) -> Result<Vec<AuditEvent>, AuditError> {
    let path = paths::audit_file_for(audit_dir, day);
    if !path.as_std_path().exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path.as_std_path()).map_err(|e| AuditError::ReadFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: AuditEvent =
            serde_json::from_str(line).map_err(|e| AuditError::InvalidEvent {
                line: index + 1,
                reason: e.to_string(),
            })?;
        events.push(event);
    }
    Ok(events)
}

/// Apply a [`ViewFilter`], preserving event order.
#[must_use]
pub fn filter_events(events: Vec<AuditEvent>, filter: &ViewFilter) -> Vec<AuditEvent> {
    events
        .into_iter()
        .filter(|event| {
            if filter.changes_only && event.event_type() == "match_unchanged" {
                return false;
            }
            if let Some(wanted) = &filter.event_type
                && event.event_type() != wanted
            {
                return false;
            }
            if let Some(league) = filter.league
                && event.league() != Some(league)
            {
                return false;
            }
            if let Some(match_id) = &filter.match_id
                && event.correlation_id() != Some(match_id.as_str())
            {
                return false;
            }
            if let Some(run_id) = &filter.run_id
                && event.run_id() != run_id
            {
                return false;
            }
            true
        })
        .collect()
}

/// Aggregated counters for one audit day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub runs_started: usize,
    pub runs_completed: usize,
    pub runs_failed: usize,
    pub discovered: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub queue_submitted: usize,
    pub queue_failed: usize,
    /// Distinct matches touched by any event that day.
    pub distinct_matches: usize,
}

/// Aggregate a day's events.
#[must_use]
pub fn day_stats(events: &[AuditEvent]) -> DayStats {
    let mut stats = DayStats::default();
    let mut matches = BTreeSet::new();

    for event in events {
        match event {
            AuditEvent::RunStarted { .. } => stats.runs_started += 1,
            AuditEvent::RunCompleted { success, .. } => {
                stats.runs_completed += 1;
                if !success {
                    stats.runs_failed += 1;
                }
            }
            AuditEvent::MatchDiscovered { .. } => stats.discovered += 1,
            AuditEvent::MatchUpdated { .. } => stats.updated += 1,
            AuditEvent::MatchUnchanged { .. } => stats.unchanged += 1,
            AuditEvent::QueueSubmitted { .. } => stats.queue_submitted += 1,
            AuditEvent::QueueFailed { .. } => stats.queue_failed += 1,
        }
        if let Some(id) = event.correlation_id() {
            matches.insert(id.to_string());
        }
    }

    stats.distinct_matches = matches.len();
    stats
}

/// One-line text rendering for `audit view --format text`.
#[must_use]
pub fn render_text(event: &AuditEvent) -> String {
    let ts = event.timestamp().format("%H:%M:%S");
    match event {
        AuditEvent::RunStarted {
            run_id,
            run_metadata,
            ..
        } => format!(
            "{ts} run_started      {run_id} {} {} {} [{}]",
            run_metadata.league, run_metadata.age_group, run_metadata.division,
            run_metadata.date_range
        ),
        AuditEvent::RunCompleted {
            run_id,
            summary,
            success,
            ..
        } => format!(
            "{ts} run_completed    {run_id} total={} discovered={} updated={} unchanged={} submitted={} failed={} success={success}",
            summary.total_matches,
            summary.discovered,
            summary.updated,
            summary.unchanged,
            summary.queue_submitted,
            summary.queue_failed
        ),
        AuditEvent::MatchDiscovered {
            correlation_id,
            match_data,
            ..
        } => format!(
            "{ts} match_discovered {correlation_id} {} vs {} on {} ({})",
            match_data.home_team, match_data.away_team, match_data.match_date,
            match_data.match_status
        ),
        AuditEvent::MatchUpdated {
            correlation_id,
            changes,
            ..
        } => {
            let fields: Vec<&str> = changes.keys().map(String::as_str).collect();
            format!("{ts} match_updated    {correlation_id} changed: {}", fields.join(", "))
        }
        AuditEvent::MatchUnchanged { correlation_id, .. } => {
            format!("{ts} match_unchanged  {correlation_id}")
        }
        AuditEvent::QueueSubmitted {
            correlation_id,
            queue_task_id,
            ..
        } => format!("{ts} queue_submitted  {correlation_id} task={queue_task_id}"),
        AuditEvent::QueueFailed {
            correlation_id,
            error_message,
            ..
        } => format!("{ts} queue_failed     {correlation_id} error: {error_message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RunMetadata, RunSummary};
    use crate::writer::AuditWriter;
    use camino::Utf8PathBuf;
    use chrono::{DateTime, TimeZone, Utc};
    use matchscraper_utils::types::{AgeGroup, Match, MatchStatus};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn ts(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 12, 6, 0, sec).unwrap()
    }

    fn metadata(league: League) -> RunMetadata {
        RunMetadata {
            league,
            age_group: AgeGroup::U14,
            division: "Northeast".to_string(),
            date_range: "2025-09-12 to 2025-09-19".to_string(),
        }
    }

    fn sample_match(id: &str, league: League) -> Match {
        Match {
            external_match_id: id.to_string(),
            home_team: "IFA".to_string(),
            away_team: "NEFC".to_string(),
            match_date: chrono::NaiveDate::from_ymd_opt(2025, 9, 13).unwrap(),
            match_time: None,
            venue: None,
            league,
            age_group: AgeGroup::U14,
            division: "Northeast".to_string(),
            match_type: "League".to_string(),
            season: "2025-26".to_string(),
            match_status: MatchStatus::Scheduled,
            home_score: None,
            away_score: None,
        }
    }

    fn sample_events() -> Vec<AuditEvent> {
        vec![
            AuditEvent::RunStarted {
                timestamp: ts(0),
                run_id: "run-1".to_string(),
                run_metadata: metadata(League::Homegrown),
            },
            AuditEvent::MatchDiscovered {
                timestamp: ts(1),
                run_id: "run-1".to_string(),
                correlation_id: "100436".to_string(),
                match_data: sample_match("100436", League::Homegrown),
            },
            AuditEvent::MatchUnchanged {
                timestamp: ts(2),
                run_id: "run-1".to_string(),
                correlation_id: "100437".to_string(),
                match_data: sample_match("100437", League::Homegrown),
            },
            AuditEvent::QueueSubmitted {
                timestamp: ts(3),
                run_id: "run-1".to_string(),
                correlation_id: "100436".to_string(),
                queue_task_id: Uuid::from_u128(1),
                queue_success: true,
            },
            AuditEvent::RunCompleted {
                timestamp: ts(4),
                run_id: "run-1".to_string(),
                run_metadata: metadata(League::Homegrown),
                summary: RunSummary {
                    total_matches: 2,
                    discovered: 1,
                    unchanged: 1,
                    queue_submitted: 1,
                    ..RunSummary::default()
                },
                success: true,
            },
            AuditEvent::RunStarted {
                timestamp: ts(10),
                run_id: "run-2".to_string(),
                run_metadata: metadata(League::Academy),
            },
        ]
    }

    #[test]
    fn round_trips_through_the_writer() {
        let dir = TempDir::new().unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut writer = AuditWriter::new(&audit_dir);
        for event in sample_events() {
            writer.append(&event).unwrap();
        }

        let day = chrono::NaiveDate::from_ymd_opt(2025, 9, 12).unwrap();
        let events = read_events(&audit_dir, day).unwrap();
        assert_eq!(events, sample_events());
    }

    #[test]
    fn missing_day_is_empty() {
        let dir = TempDir::new().unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(read_events(&audit_dir, day).unwrap().is_empty());
    }

    #[test]
    fn corrupt_line_reports_its_number() {
        let dir = TempDir::new().unwrap();
        let audit_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2025, 9, 12).unwrap();
        let path = paths::audit_file_for(&audit_dir, day);
        fs::write(path.as_std_path(), "{\"event_type\":\"run_started\"\nnot json\n").unwrap();

        let err = read_events(&audit_dir, day).unwrap_err();
        assert!(matches!(err, AuditError::InvalidEvent { line: 1, .. }));
    }

    #[test]
    fn changes_only_drops_unchanged() {
        let filtered = filter_events(
            sample_events(),
            &ViewFilter {
                changes_only: true,
                ..ViewFilter::default()
            },
        );
        assert!(filtered.iter().all(|e| e.event_type() != "match_unchanged"));
        assert_eq!(filtered.len(), sample_events().len() - 1);
    }

    #[test]
    fn filters_compose_conjunctively() {
        let filtered = filter_events(
            sample_events(),
            &ViewFilter {
                league: Some(League::Homegrown),
                event_type: Some("run_started".to_string()),
                ..ViewFilter::default()
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].run_id(), "run-1");
    }

    #[test]
    fn match_id_filter_follows_the_correlation_id() {
        let filtered = filter_events(
            sample_events(),
            &ViewFilter {
                match_id: Some("100436".to_string()),
                ..ViewFilter::default()
            },
        );
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].event_type(), "match_discovered");
        assert_eq!(filtered[1].event_type(), "queue_submitted");
    }

    #[test]
    fn run_id_filter_selects_one_run() {
        let filtered = filter_events(
            sample_events(),
            &ViewFilter {
                run_id: Some("run-2".to_string()),
                ..ViewFilter::default()
            },
        );
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn stats_count_every_kind() {
        let stats = day_stats(&sample_events());
        assert_eq!(stats.runs_started, 2);
        assert_eq!(stats.runs_completed, 1);
        assert_eq!(stats.runs_failed, 0);
        assert_eq!(stats.discovered, 1);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.queue_submitted, 1);
        assert_eq!(stats.distinct_matches, 2);
    }

    #[test]
    fn failed_runs_are_counted_separately() {
        let mut events = sample_events();
        events.push(AuditEvent::RunCompleted {
            timestamp: ts(20),
            run_id: "run-2".to_string(),
            run_metadata: metadata(League::Academy),
            summary: RunSummary::default(),
            success: false,
        });
        let stats = day_stats(&events);
        assert_eq!(stats.runs_completed, 2);
        assert_eq!(stats.runs_failed, 1);
    }

    #[test]
    fn text_rendering_is_single_line() {
        for event in sample_events() {
            let text = render_text(&event);
            assert!(!text.contains('\n'));
            assert!(text.contains(event.event_type()));
        }
    }
}
