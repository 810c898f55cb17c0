//! Extraction driver: raw records to normalized matches.

use chrono::NaiveDate;
use matchscraper_browser::page::{RawMatchRecord, ResultsSnapshot};
use matchscraper_utils::error::ParseError;
use matchscraper_utils::types::{AgeGroup, League, Match};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::normalize::TeamNameNormalizer;
use crate::parse::{Markers, classify, parse_match_date, parse_match_time};

/// Active-configuration fields stamped onto every extracted match.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub league: League,
    pub age_group: AgeGroup,
    pub division: String,
    pub season: String,
    /// Inclusive scraped window; rows outside it are skipped as parse
    /// failures rather than emitted.
    pub range_from: NaiveDate,
    pub range_to: NaiveDate,
    /// "Today" for past/future status decisions. Injected for determinism.
    pub today: NaiveDate,
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub matches: Vec<Match>,
    /// Rows that failed row-level parsing and were skipped.
    pub skipped: usize,
}

/// Parses the results snapshot into normalized matches.
pub struct Extractor {
    context: ExtractionContext,
    normalizer: TeamNameNormalizer,
}

impl Extractor {
    #[must_use]
    pub fn new(context: ExtractionContext, normalizer: TeamNameNormalizer) -> Self {
        Self { context, normalizer }
    }

    /// Extract every record in the snapshot.
    ///
    /// Row-level failures are logged at warning level and counted; the
    /// whole pass fails only when the container reports at least one match
    /// and nothing was extractable.
    pub fn extract(&self, snapshot: &ResultsSnapshot) -> Result<ExtractionReport, ParseError> {
        let mut matches = Vec::with_capacity(snapshot.records.len());
        let mut skipped = 0usize;

        for (index, record) in snapshot.records.iter().enumerate() {
            match self.extract_one(record) {
                Ok(m) => matches.push(m),
                Err(e) => {
                    skipped += 1;
                    warn!(row = index, error = %e, "skipping unparseable row");
                }
            }
        }

        let reported = snapshot.reported_count.unwrap_or(snapshot.records.len());
        if matches.is_empty() && reported >= 1 {
            return Err(ParseError::BatchEmpty { reported });
        }

        debug!(
            layout = ?snapshot.layout,
            extracted = matches.len(),
            skipped,
            "extraction pass complete"
        );
        Ok(ExtractionReport { matches, skipped })
    }

    fn extract_one(&self, record: &RawMatchRecord) -> Result<Match, ParseError> {
        let home_raw = record
            .field("home_team")
            .ok_or(ParseError::MissingField { field: "home_team" })?;
        let away_raw = record
            .field("away_team")
            .ok_or(ParseError::MissingField { field: "away_team" })?;
        let date_raw = record
            .field("date")
            .ok_or(ParseError::MissingField { field: "date" })?;

        let home_team = self.normalizer.normalize(home_raw);
        let away_team = self.normalizer.normalize(away_raw);
        let match_date = parse_match_date(date_raw)?;

        let match_time = match record.field("time") {
            // "TBD" in the time column is common and means no kickoff time
            // has been announced.
            Some(raw) if !raw.eq_ignore_ascii_case("tbd") => Some(parse_match_time(raw)?),
            _ => None,
        };

        let markers = Markers::new(record.field("status"), &record.markers);
        let (match_status, home_score, away_score) = classify(
            record.field("score"),
            &markers,
            match_date,
            self.context.today,
        );

        let external_match_id = match record.attributes.get("data-match-id") {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => self.synthesize_id(&home_team, &away_team, match_date),
        };

        let m = Match {
            external_match_id,
            home_team,
            away_team,
            match_date,
            match_time,
            venue: record.field("venue").map(str::to_string),
            league: self.context.league,
            age_group: self.context.age_group,
            division: self.context.division.clone(),
            match_type: "League".to_string(),
            season: self.context.season.clone(),
            match_status,
            home_score,
            away_score,
        };

        m.validate()
            .map_err(|e| ParseError::MissingField { field: validation_field(&e) })?;
        m.validate_in_range(self.context.range_from, self.context.range_to)
            .map_err(|_| ParseError::MissingField { field: "match_date" })?;

        Ok(m)
    }

    /// Deterministic id for rows that carry no stable data attribute:
    /// SHA-256 over the identity fields, truncated to 16 hex chars.
    fn synthesize_id(&self, home: &str, away: &str, date: NaiveDate) -> String {
        let mut hasher = Sha256::new();
        for part in [
            home,
            away,
            &date.format("%Y-%m-%d").to_string(),
            &self.context.division,
            &self.context.age_group.to_string(),
            &self.context.league.to_string(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())[..16].to_string()
    }
}

fn validation_field(err: &matchscraper_utils::error::ValidationError) -> &'static str {
    use matchscraper_utils::error::ValidationError as V;
    match err {
        V::EmptyExternalId => "external_match_id",
        V::EmptyTeam { side: "home", .. } => "home_team",
        V::EmptyTeam { .. } => "away_team",
        V::CompletedWithoutScores { .. } | V::ScoresWithoutCompleted { .. } => "score",
        V::DateOutOfRange { .. } => "match_date",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchscraper_browser::page::ResultsLayout;
    use matchscraper_utils::types::MatchStatus;
    use std::collections::HashMap;

    fn context() -> ExtractionContext {
        ExtractionContext {
            league: League::Homegrown,
            age_group: AgeGroup::U14,
            division: "Northeast".to_string(),
            season: "2025-26".to_string(),
            range_from: NaiveDate::from_ymd_opt(2025, 9, 12).unwrap(),
            range_to: NaiveDate::from_ymd_opt(2025, 9, 19).unwrap(),
            today: NaiveDate::from_ymd_opt(2025, 9, 16).unwrap(),
        }
    }

    fn extractor() -> Extractor {
        Extractor::new(context(), TeamNameNormalizer::default())
    }

    fn record(fields: &[(&str, &str)]) -> RawMatchRecord {
        RawMatchRecord {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            attributes: HashMap::new(),
            markers: String::new(),
        }
    }

    fn snapshot(records: Vec<RawMatchRecord>) -> ResultsSnapshot {
        let n = records.len();
        ResultsSnapshot {
            layout: ResultsLayout::Table,
            records,
            reported_count: Some(n),
        }
    }

    #[test]
    fn completed_row_extracts_with_scores() {
        let mut r = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "09/13/2025"),
            ("time", "2:30 PM"),
            ("score", "5-1"),
            ("status", "Final"),
            ("venue", "Union Point"),
        ]);
        r.attributes
            .insert("data-match-id".to_string(), "100436".to_string());

        let report = extractor().extract(&snapshot(vec![r])).unwrap();
        assert_eq!(report.skipped, 0);
        let m = &report.matches[0];
        assert_eq!(m.external_match_id, "100436");
        assert_eq!(m.match_status, MatchStatus::Completed);
        assert_eq!(m.home_score, Some(5));
        assert_eq!(m.away_score, Some(1));
        assert_eq!(m.venue.as_deref(), Some("Union Point"));
        assert_eq!(m.season, "2025-26");
    }

    #[test]
    fn scheduled_row_has_no_scores() {
        let r = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "09/18/2025"),
            ("time", "10:00 AM"),
        ]);
        let report = extractor().extract(&snapshot(vec![r])).unwrap();
        let m = &report.matches[0];
        assert_eq!(m.match_status, MatchStatus::Scheduled);
        assert_eq!(m.home_score, None);
        assert_eq!(m.away_score, None);
    }

    #[test]
    fn long_club_name_is_normalized_before_id_synthesis() {
        let r = record(&[
            ("home_team", "Intercontinental Football Academy of New England"),
            ("away_team", "NEFC"),
            ("date", "2025-09-13"),
            ("score", "2-1"),
        ]);
        let report = extractor().extract(&snapshot(vec![r])).unwrap();
        let m = &report.matches[0];
        assert_eq!(m.home_team, "IFA");

        // Same fixture under the short name synthesizes the same id.
        let r2 = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "2025-09-13"),
            ("score", "2-1"),
        ]);
        let report2 = extractor().extract(&snapshot(vec![r2])).unwrap();
        assert_eq!(report2.matches[0].external_match_id, m.external_match_id);
    }

    #[test]
    fn synthesized_ids_are_16_hex_and_distinct_per_fixture() {
        let a = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "2025-09-13"),
        ]);
        let b = record(&[
            ("home_team", "NEFC"),
            ("away_team", "IFA"),
            ("date", "2025-09-13"),
        ]);
        let report = extractor().extract(&snapshot(vec![a, b])).unwrap();
        let id_a = &report.matches[0].external_match_id;
        let id_b = &report.matches[1].external_match_id;
        assert_eq!(id_a.len(), 16);
        assert!(id_a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn bad_row_is_skipped_and_counted() {
        let good = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "09/13/2025"),
            ("score", "1-0"),
        ]);
        let bad = record(&[
            ("home_team", "IFA"),
            ("away_team", "Bolts"),
            ("date", "next Tuesday"),
        ]);
        let report = extractor().extract(&snapshot(vec![good, bad])).unwrap();
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn row_outside_scraped_range_is_skipped() {
        let r = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "10/01/2025"),
        ]);
        let out = extractor().extract(&snapshot(vec![r]));
        // Only row in batch and container reported 1: batch failure.
        assert!(matches!(out, Err(ParseError::BatchEmpty { reported: 1 })));
    }

    #[test]
    fn all_rows_unparseable_fails_the_batch() {
        let bad = record(&[("home_team", "IFA")]);
        let result = extractor().extract(&snapshot(vec![bad]));
        assert!(matches!(result, Err(ParseError::BatchEmpty { .. })));
    }

    #[test]
    fn empty_result_set_is_not_an_error() {
        let report = extractor().extract(&snapshot(vec![])).unwrap();
        assert!(report.matches.is_empty());
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn card_layout_parses_like_table_layout() {
        // Card tiles produce the same field keys as header-mapped rows;
        // the extractor is layout-agnostic.
        let card = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "September 13, 2025"),
            ("time", "2:30 PM"),
            ("score", "1-1"),
            ("status", "Full Time"),
        ]);
        let snapshot = ResultsSnapshot {
            layout: ResultsLayout::Cards,
            records: vec![card],
            reported_count: None,
        };
        let report = extractor().extract(&snapshot).unwrap();
        let m = &report.matches[0];
        assert_eq!(m.match_status, MatchStatus::Completed);
        assert_eq!((m.home_score, m.away_score), (Some(1), Some(1)));
        assert_eq!(
            m.match_time,
            chrono::NaiveTime::from_hms_opt(14, 30, 0)
        );
    }

    #[test]
    fn tbd_time_column_is_treated_as_absent() {
        let r = record(&[
            ("home_team", "IFA"),
            ("away_team", "NEFC"),
            ("date", "09/18/2025"),
            ("time", "TBD"),
        ]);
        let report = extractor().extract(&snapshot(vec![r])).unwrap();
        assert_eq!(report.matches[0].match_time, None);
    }
}
