//! Normalized match model shared by every pipeline stage.
//!
//! The extractor produces [`Match`] records, the change detector compares
//! them, the audit writer embeds them in events, and the queue publisher
//! serializes them as message bodies. No other match representation crosses
//! a component boundary.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ValidationError;

/// Upstream league namespace. External match ids are only unique within one
/// of these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum League {
    Homegrown,
    Academy,
}

impl League {
    /// Schedule URL for this league's public listing page.
    #[must_use]
    pub const fn schedule_url(self) -> &'static str {
        match self {
            Self::Homegrown => "https://www.mlssoccer.com/mlsnext/schedule/homegrown/",
            Self::Academy => "https://www.mlssoccer.com/mlsnext/schedule/academy/",
        }
    }
}

/// Age brackets offered by the upstream schedule UI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum AgeGroup {
    U13,
    U14,
    U15,
    U16,
    U17,
    U19,
}

impl AgeGroup {
    /// The `js-age` option value the upstream dropdown uses for this bracket.
    #[must_use]
    pub const fn upstream_value(self) -> &'static str {
        match self {
            Self::U13 => "21",
            Self::U14 => "22",
            Self::U15 => "33",
            Self::U16 => "14",
            Self::U17 => "15",
            Self::U19 => "26",
        }
    }

    /// All brackets in display order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [Self::U13, Self::U14, Self::U15, Self::U16, Self::U17, Self::U19]
    }
}

/// Divisions the config resolver accepts. The upstream UI rewrites this list
/// per league and age group; validation here only guards against typos.
pub const DIVISIONS: &[&str] = &[
    "Northeast",
    "Atlantic",
    "Southeast",
    "Mid-America",
    "Central",
    "Great Lakes",
    "Texas",
    "Frontier",
    "Southwest",
    "Northwest",
];

/// Lifecycle state of a match as classified by the extractor.
///
/// Serialized forms are part of the broker wire contract: lowercase with
/// underscores, except the placeholder `TBD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum MatchStatus {
    #[serde(rename = "scheduled")]
    #[strum(serialize = "scheduled")]
    Scheduled,
    #[serde(rename = "in_progress")]
    #[strum(serialize = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    #[strum(serialize = "completed")]
    Completed,
    #[serde(rename = "postponed")]
    #[strum(serialize = "postponed")]
    Postponed,
    #[serde(rename = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
    #[serde(rename = "TBD")]
    #[strum(serialize = "TBD")]
    Tbd,
}

/// A normalized match observation.
///
/// Invariants (enforced by [`Match::validate`]):
/// - `match_status == Completed` implies both scores are present;
///   any other status implies both are absent.
/// - Team names and the external id are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Stable identifier assigned by the upstream league. Primary key for
    /// change detection; unique only within `(league, age_group, division)`.
    pub external_match_id: String,
    pub home_team: String,
    pub away_team: String,
    /// Local calendar date of the match.
    pub match_date: NaiveDate,
    /// Local kickoff time when the listing carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    pub league: League,
    pub age_group: AgeGroup,
    pub division: String,
    pub match_type: String,
    pub season: String,
    pub match_status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
}

impl Match {
    /// Wall-clock instant of the match: the calendar date combined with the
    /// kickoff time, or midnight when no time was listed.
    #[must_use]
    pub fn match_datetime(&self) -> NaiveDateTime {
        let time = self
            .match_time
            .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
        self.match_date.and_time(time)
    }

    /// Validate the record against the model invariants.
    ///
    /// Run at every component boundary: extractor output, change-detector
    /// input, and immediately before each queue publish.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.external_match_id.trim().is_empty() {
            return Err(ValidationError::EmptyExternalId);
        }
        if self.home_team.trim().is_empty() {
            return Err(ValidationError::EmptyTeam {
                id: self.external_match_id.clone(),
                side: "home",
            });
        }
        if self.away_team.trim().is_empty() {
            return Err(ValidationError::EmptyTeam {
                id: self.external_match_id.clone(),
                side: "away",
            });
        }
        match self.match_status {
            MatchStatus::Completed => {
                if self.home_score.is_none() || self.away_score.is_none() {
                    return Err(ValidationError::CompletedWithoutScores {
                        id: self.external_match_id.clone(),
                    });
                }
            }
            status => {
                if self.home_score.is_some() || self.away_score.is_some() {
                    return Err(ValidationError::ScoresWithoutCompleted {
                        id: self.external_match_id.clone(),
                        status: status.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate that the match date falls inside the scraped range,
    /// inclusive on both ends.
    pub fn validate_in_range(&self, from: NaiveDate, to: NaiveDate) -> Result<(), ValidationError> {
        if self.match_date < from || self.match_date > to {
            return Err(ValidationError::DateOutOfRange {
                id: self.external_match_id.clone(),
                date: self.match_date,
                from,
                to,
            });
        }
        Ok(())
    }
}

/// Season label for a match date, e.g. `2024-25`.
///
/// The upstream season rolls over in August: July and earlier belong to the
/// season that started the previous calendar year.
#[must_use]
pub fn season_for(date: NaiveDate) -> String {
    let start_year = if date.month() >= 8 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{:02}", start_year, (start_year + 1) % 100)
}
