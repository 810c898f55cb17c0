//! Change detection against the prior-run snapshot.

use std::collections::BTreeMap;

use matchscraper_utils::types::Match;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::store::Snapshot;

/// Before/after values for one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// Per-field diffs for an updated match, keyed by field name.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// Result of comparing one scrape against the prior snapshot.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    pub discovered: Vec<Match>,
    pub updated: Vec<(Match, ChangeSet)>,
    pub unchanged: Vec<Match>,
    /// Prior snapshot with every observed match folded in. Entries for ids
    /// not seen this run are retained: the snapshot is additive.
    pub snapshot: Snapshot,
}

impl DetectionOutcome {
    #[must_use]
    pub fn total_observed(&self) -> usize {
        self.discovered.len() + self.updated.len() + self.unchanged.len()
    }
}

/// Fields compared for update detection, with their diff rendering.
fn diff_fields(prior: &Match, current: &Match) -> ChangeSet {
    let mut changes = ChangeSet::new();

    if prior.match_status != current.match_status {
        changes.insert(
            "match_status".to_string(),
            FieldChange {
                from: json!(prior.match_status),
                to: json!(current.match_status),
            },
        );
    }
    if prior.home_score != current.home_score {
        changes.insert(
            "home_score".to_string(),
            FieldChange {
                from: json!(prior.home_score),
                to: json!(current.home_score),
            },
        );
    }
    if prior.away_score != current.away_score {
        changes.insert(
            "away_score".to_string(),
            FieldChange {
                from: json!(prior.away_score),
                to: json!(current.away_score),
            },
        );
    }
    if prior.match_datetime() != current.match_datetime() {
        changes.insert(
            "match_datetime".to_string(),
            FieldChange {
                from: json!(prior.match_datetime()),
                to: json!(current.match_datetime()),
            },
        );
    }
    if prior.venue != current.venue {
        changes.insert(
            "venue".to_string(),
            FieldChange {
                from: json!(prior.venue),
                to: json!(current.venue),
            },
        );
    }

    changes
}

/// Classify every observed match against the prior snapshot.
///
/// Order of the input is preserved within each classification list.
#[must_use]
pub fn detect_changes(prior: &Snapshot, observed: &[Match]) -> DetectionOutcome {
    let mut outcome = DetectionOutcome {
        snapshot: prior.clone(),
        ..DetectionOutcome::default()
    };

    for m in observed {
        match prior.get(&m.external_match_id) {
            None => outcome.discovered.push(m.clone()),
            Some(previous) => {
                let changes = diff_fields(previous, m);
                if changes.is_empty() {
                    outcome.unchanged.push(m.clone());
                } else {
                    outcome.updated.push((m.clone(), changes));
                }
            }
        }
        outcome
            .snapshot
            .insert(m.external_match_id.clone(), m.clone());
    }

    outcome
}
