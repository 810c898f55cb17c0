//! Property-based checks over the parser, model invariants, and change
//! detection.

use std::collections::HashMap;

use chrono::NaiveDate;
use matchscraper::{
    ExtractionContext, Extractor, Match, MatchStatus, RawMatchRecord, ResultsLayout,
    ResultsSnapshot, TeamNameNormalizer, detect_changes,
};
use matchscraper_extract::parse_match_date;
use matchscraper_utils::clock::test_support::{FixedClock, SequentialIdGen};
use matchscraper_utils::clock::{IdGen, RandomIdGen, new_run_id};
use matchscraper_utils::types::{AgeGroup, League};
use proptest::prelude::*;

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2024i32..2027, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_team() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,18}[A-Za-z]".prop_map(|s| s)
}

fn arb_score_cell() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        (0u32..9, 0u32..9).prop_map(|(h, a)| Some(format!("{h}-{a}"))),
        Just(Some("vs".to_string())),
        Just(Some(String::new())),
    ]
}

fn arb_status() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Final".to_string())),
        Just(Some("Live".to_string())),
        Just(Some("Postponed".to_string())),
        Just(Some("Cancelled".to_string())),
        Just(Some("Scheduled".to_string())),
    ]
}

fn extractor(from: NaiveDate, to: NaiveDate, today: NaiveDate) -> Extractor {
    Extractor::new(
        ExtractionContext {
            league: League::Homegrown,
            age_group: AgeGroup::U14,
            division: "Northeast".to_string(),
            season: "2025-26".to_string(),
            range_from: from,
            range_to: to,
            today,
        },
        TeamNameNormalizer::default(),
    )
}

fn record_for(
    home: &str,
    away: &str,
    date: NaiveDate,
    score: Option<&str>,
    status: Option<&str>,
) -> RawMatchRecord {
    let mut fields = HashMap::new();
    fields.insert("home_team".to_string(), home.to_string());
    fields.insert("away_team".to_string(), away.to_string());
    fields.insert("date".to_string(), date.format("%m/%d/%Y").to_string());
    if let Some(score) = score {
        fields.insert("score".to_string(), score.to_string());
    }
    if let Some(status) = status {
        fields.insert("status".to_string(), status.to_string());
    }
    RawMatchRecord {
        fields,
        attributes: HashMap::new(),
        markers: String::new(),
    }
}

proptest! {
    /// The three accepted date encodings of one day parse identically.
    #[test]
    fn date_encodings_agree(date in arb_date()) {
        let mdy = date.format("%m/%d/%Y").to_string();
        let iso = date.format("%Y-%m-%d").to_string();
        let long = date.format("%B %d, %Y").to_string();
        prop_assert_eq!(parse_match_date(&mdy).unwrap(), date);
        prop_assert_eq!(parse_match_date(&iso).unwrap(), date);
        prop_assert_eq!(parse_match_date(&long).unwrap(), date);
    }

    /// Every extracted match honors the score/status invariant: completed
    /// matches carry both scores, every other status carries none.
    #[test]
    fn extraction_never_violates_score_invariants(
        home in arb_team(),
        away in arb_team(),
        date in arb_date(),
        score in arb_score_cell(),
        status in arb_status(),
    ) {
        let today = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        let ex = extractor(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            today,
        );
        let snapshot = ResultsSnapshot {
            layout: ResultsLayout::Table,
            records: vec![record_for(&home, &away, date, score.as_deref(), status.as_deref())],
            reported_count: Some(1),
        };
        let report = ex.extract(&snapshot).unwrap();
        for m in &report.matches {
            prop_assert!(m.validate().is_ok());
            match m.match_status {
                MatchStatus::Completed => {
                    prop_assert!(m.home_score.is_some() && m.away_score.is_some());
                }
                _ => {
                    prop_assert!(m.home_score.is_none() && m.away_score.is_none());
                }
            }
        }
    }

    /// A 0-0 cell never turns into a completed match without a final marker.
    #[test]
    fn nil_nil_placeholder_is_never_completed(
        date in arb_date(),
        status in prop_oneof![Just(None), Just(Some("Scheduled".to_string()))],
    ) {
        let today = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        let ex = extractor(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            today,
        );
        let snapshot = ResultsSnapshot {
            layout: ResultsLayout::Table,
            records: vec![record_for("IFA", "NEFC", date, Some("0-0"), status.as_deref())],
            reported_count: Some(1),
        };
        let report = ex.extract(&snapshot).unwrap();
        for m in &report.matches {
            prop_assert_ne!(m.match_status, MatchStatus::Completed);
            prop_assert_eq!(m.home_score, None);
        }
    }

    /// discovered + updated + unchanged always equals the number observed,
    /// and every observed id lands in the post-run snapshot.
    #[test]
    fn detection_partitions_the_batch(
        ids in proptest::collection::btree_set("[a-z][a-z0-9]{1,6}", 1..20),
        prior_fraction in 0usize..=100,
    ) {
        let today = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        let ex = extractor(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            today,
        );
        let date = NaiveDate::from_ymd_opt(2025, 9, 18).unwrap();
        let mut observed: Vec<Match> = Vec::new();
        for id in &ids {
            let mut record = record_for(id, "NEFC", date, None, None);
            record
                .attributes
                .insert("data-match-id".to_string(), id.clone());
            let snapshot = ResultsSnapshot {
                layout: ResultsLayout::Table,
                records: vec![record],
                reported_count: Some(1),
            };
            observed.extend(ex.extract(&snapshot).unwrap().matches);
        }

        // Seed the prior snapshot with a slice of the observed matches.
        let cutoff = observed.len() * prior_fraction / 100;
        let prior: std::collections::BTreeMap<String, Match> = observed[..cutoff]
            .iter()
            .map(|m| (m.external_match_id.clone(), m.clone()))
            .collect();

        let outcome = detect_changes(&prior, &observed);
        prop_assert_eq!(
            outcome.discovered.len() + outcome.updated.len() + outcome.unchanged.len(),
            observed.len()
        );
        for m in &observed {
            prop_assert!(outcome.snapshot.contains_key(&m.external_match_id));
            prop_assert_eq!(&outcome.snapshot[&m.external_match_id], m);
        }
    }

    /// Valid matches survive a JSON round trip bit-for-bit.
    #[test]
    fn match_json_round_trips(
        home in arb_team(),
        away in arb_team(),
        date in arb_date(),
        completed in any::<bool>(),
        home_score in 0u32..15,
        away_score in 0u32..15,
    ) {
        let m = Match {
            external_match_id: "100436".to_string(),
            home_team: home,
            away_team: away,
            match_date: date,
            match_time: None,
            venue: None,
            league: League::Homegrown,
            age_group: AgeGroup::U14,
            division: "Northeast".to_string(),
            match_type: "League".to_string(),
            season: "2025-26".to_string(),
            match_status: if completed {
                MatchStatus::Completed
            } else {
                MatchStatus::Scheduled
            },
            home_score: completed.then_some(home_score),
            away_score: completed.then_some(away_score),
        };
        prop_assert!(m.validate().is_ok());
        let json = serde_json::to_string(&m).unwrap();
        let back: Match = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, m);
    }
}

#[test]
fn run_ids_are_well_formed() {
    let clock = FixedClock::at(2025, 9, 12, 6, 30, 5);
    let ids = SequentialIdGen::default();
    let run_id = new_run_id(&clock, &ids);
    assert!(run_id.starts_with("20250912-063005-"));

    let random = new_run_id(&clock, &RandomIdGen);
    let suffix = random.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 6);
}

#[test]
fn task_ids_are_v4_uuids() {
    let ids = RandomIdGen;
    for _ in 0..10 {
        assert_eq!(ids.task_id().get_version_num(), 4);
    }
}
