//! Audit event model.
//!
//! The `event_type` tag and field names are a wire contract with the log
//! tooling that tails these files; renames here are breaking changes.

use chrono::{DateTime, Utc};
use matchscraper_state::ChangeSet;
use matchscraper_utils::types::{AgeGroup, League, Match};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scope of a run, repeated on its start and completion events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub league: League,
    pub age_group: AgeGroup,
    pub division: String,
    /// Resolved range as `YYYY-MM-DD to YYYY-MM-DD`.
    pub date_range: String,
}

/// Counters reported on `run_completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_matches: usize,
    pub discovered: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub queue_submitted: usize,
    pub queue_failed: usize,
}

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    RunStarted {
        timestamp: DateTime<Utc>,
        run_id: String,
        run_metadata: RunMetadata,
    },
    RunCompleted {
        timestamp: DateTime<Utc>,
        run_id: String,
        run_metadata: RunMetadata,
        summary: RunSummary,
        success: bool,
    },
    MatchDiscovered {
        timestamp: DateTime<Utc>,
        run_id: String,
        /// The external match id, tying together every event about this
        /// match.
        correlation_id: String,
        match_data: Match,
    },
    MatchUpdated {
        timestamp: DateTime<Utc>,
        run_id: String,
        correlation_id: String,
        match_data: Match,
        changes: ChangeSet,
    },
    MatchUnchanged {
        timestamp: DateTime<Utc>,
        run_id: String,
        correlation_id: String,
        match_data: Match,
    },
    QueueSubmitted {
        timestamp: DateTime<Utc>,
        run_id: String,
        correlation_id: String,
        queue_task_id: Uuid,
        queue_success: bool,
    },
    QueueFailed {
        timestamp: DateTime<Utc>,
        run_id: String,
        correlation_id: String,
        queue_task_id: Option<Uuid>,
        queue_success: bool,
        error_message: String,
    },
}

impl AuditEvent {
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::RunStarted { timestamp, .. }
            | Self::RunCompleted { timestamp, .. }
            | Self::MatchDiscovered { timestamp, .. }
            | Self::MatchUpdated { timestamp, .. }
            | Self::MatchUnchanged { timestamp, .. }
            | Self::QueueSubmitted { timestamp, .. }
            | Self::QueueFailed { timestamp, .. } => *timestamp,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::MatchDiscovered { run_id, .. }
            | Self::MatchUpdated { run_id, .. }
            | Self::MatchUnchanged { run_id, .. }
            | Self::QueueSubmitted { run_id, .. }
            | Self::QueueFailed { run_id, .. } => run_id,
        }
    }

    /// The wire name of this event's type.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::RunCompleted { .. } => "run_completed",
            Self::MatchDiscovered { .. } => "match_discovered",
            Self::MatchUpdated { .. } => "match_updated",
            Self::MatchUnchanged { .. } => "match_unchanged",
            Self::QueueSubmitted { .. } => "queue_submitted",
            Self::QueueFailed { .. } => "queue_failed",
        }
    }

    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::MatchDiscovered { correlation_id, .. }
            | Self::MatchUpdated { correlation_id, .. }
            | Self::MatchUnchanged { correlation_id, .. }
            | Self::QueueSubmitted { correlation_id, .. }
            | Self::QueueFailed { correlation_id, .. } => Some(correlation_id),
            _ => None,
        }
    }

    /// League scope of the event, from metadata or the embedded match.
    #[must_use]
    pub fn league(&self) -> Option<League> {
        match self {
            Self::RunStarted { run_metadata, .. }
            | Self::RunCompleted { run_metadata, .. } => Some(run_metadata.league),
            Self::MatchDiscovered { match_data, .. }
            | Self::MatchUpdated { match_data, .. }
            | Self::MatchUnchanged { match_data, .. } => Some(match_data.league),
            Self::QueueSubmitted { .. } | Self::QueueFailed { .. } => None,
        }
    }
}
