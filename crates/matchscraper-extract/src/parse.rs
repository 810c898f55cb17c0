//! Date, time, and score-cell parsing.

use chrono::{NaiveDate, NaiveTime};
use matchscraper_utils::error::ParseError;
use matchscraper_utils::types::MatchStatus;
use once_cell::sync::Lazy;
use regex::Regex;

/// Two integers separated by a hyphen, en-dash, em-dash, or colon.
static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,3})\s*[-\u{2013}\u{2014}:]\s*(\d{1,3})\s*$").expect("static regex")
});

/// Accepted calendar date encodings, tried in order.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"];

/// Parse a match date. Anything outside the accepted set is rejected rather
/// than guessed at.
pub fn parse_match_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(ParseError::UnknownDateFormat(trimmed.to_string()))
}

/// Parse a kickoff time: `HH:MM AM/PM` or 24-hour `HH:MM`.
pub fn parse_match_time(raw: &str) -> Result<NaiveTime, ParseError> {
    let normalized = raw.trim().to_ascii_uppercase();
    if let Ok(time) = NaiveTime::parse_from_str(&normalized, "%I:%M %p") {
        return Ok(time);
    }
    if let Ok(time) = NaiveTime::parse_from_str(&normalized, "%H:%M") {
        return Ok(time);
    }
    Err(ParseError::UnknownTimeFormat(raw.trim().to_string()))
}

/// Parse a score cell into `(home, away)` when it carries one.
pub(crate) fn parse_score_pair(cell: &str) -> Option<(u32, u32)> {
    let caps = SCORE_RE.captures(cell)?;
    let home = caps.get(1)?.as_str().parse().ok()?;
    let away = caps.get(2)?.as_str().parse().ok()?;
    Some((home, away))
}

/// Textual markers gathered from the row: status column text plus the row
/// element's class attribute, lower-cased.
pub(crate) struct Markers(String);

impl Markers {
    pub(crate) fn new(status_text: Option<&str>, row_classes: &str) -> Self {
        let mut combined = row_classes.to_ascii_lowercase();
        if let Some(status) = status_text {
            combined.push(' ');
            combined.push_str(&status.to_ascii_lowercase());
        }
        Self(combined)
    }

    fn has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.0.contains(n))
    }

    pub(crate) fn is_final(&self) -> bool {
        // "ft" alone would match inside unrelated words.
        self.has_any(&["final", "full time", "full-time"])
            || self.0.split_whitespace().any(|w| w == "ft")
    }

    pub(crate) fn is_live(&self) -> bool {
        self.has_any(&["live", "in progress", "in_progress", "half"])
    }

    pub(crate) fn is_postponed(&self) -> bool {
        self.has_any(&["postponed", "ppd"])
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.has_any(&["cancelled", "canceled", "abandoned"])
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.has_any(&["scheduled", "preview", "upcoming"])
    }
}

/// Classify a row's status and scores from its score cell and markers.
///
/// The model invariant is enforced here: only `completed` carries scores.
/// A `0-0` cell without a final marker is the upstream placeholder and
/// yields `TBD` with no scores, even for past dates.
pub(crate) fn classify(
    score_cell: Option<&str>,
    markers: &Markers,
    match_date: NaiveDate,
    today: NaiveDate,
) -> (MatchStatus, Option<u32>, Option<u32>) {
    if markers.is_postponed() {
        return (MatchStatus::Postponed, None, None);
    }
    if markers.is_cancelled() {
        return (MatchStatus::Cancelled, None, None);
    }
    if markers.is_live() {
        return (MatchStatus::InProgress, None, None);
    }

    let scores = score_cell.and_then(parse_score_pair);
    match scores {
        Some((home, away)) => {
            if markers.is_final() {
                return (MatchStatus::Completed, Some(home), Some(away));
            }
            if home == 0 && away == 0 {
                // Placeholder the upstream UI shows before a result is
                // entered; not a real result.
                return (MatchStatus::Tbd, None, None);
            }
            if match_date < today {
                return (MatchStatus::Completed, Some(home), Some(away));
            }
            // A score on a future match without a final marker is noise.
            (MatchStatus::Tbd, None, None)
        }
        None => {
            if markers.is_scheduled() || match_date >= today {
                (MatchStatus::Scheduled, None, None)
            } else {
                (MatchStatus::Tbd, None, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepted_date_formats_agree() {
        let expected = date(2025, 9, 12);
        assert_eq!(parse_match_date("09/12/2025").unwrap(), expected);
        assert_eq!(parse_match_date("2025-09-12").unwrap(), expected);
        assert_eq!(parse_match_date("September 12, 2025").unwrap(), expected);
        assert_eq!(parse_match_date("Sep 12, 2025").unwrap(), expected);
    }

    #[test]
    fn unknown_date_formats_are_rejected() {
        for raw in ["12.09.2025", "12/09/25", "next Tuesday", ""] {
            assert!(parse_match_date(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn times_parse_in_both_conventions() {
        assert_eq!(
            parse_match_time("2:30 PM").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap()
        );
        assert_eq!(
            parse_match_time("2:30 pm").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap()
        );
        assert_eq!(
            parse_match_time("14:30").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap()
        );
        assert!(parse_match_time("half past two").is_err());
    }

    #[test]
    fn score_pairs_accept_hyphen_and_en_dash() {
        assert_eq!(parse_score_pair("5-1"), Some((5, 1)));
        assert_eq!(parse_score_pair("5 \u{2013} 1"), Some((5, 1)));
        assert_eq!(parse_score_pair("0 - 0"), Some((0, 0)));
        assert_eq!(parse_score_pair("2:1"), Some((2, 1)));
        assert_eq!(parse_score_pair("vs"), None);
        assert_eq!(parse_score_pair(""), None);
    }

    #[test]
    fn final_marker_completes_even_at_nil_nil() {
        let markers = Markers::new(Some("FT"), "");
        let (status, h, a) = classify(Some("0-0"), &markers, date(2025, 9, 1), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Completed);
        assert_eq!((h, a), (Some(0), Some(0)));
    }

    #[test]
    fn past_nil_nil_without_final_marker_is_tbd() {
        let markers = Markers::new(None, "match-row");
        let (status, h, a) = classify(Some("0-0"), &markers, date(2025, 9, 1), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Tbd);
        assert_eq!((h, a), (None, None));
    }

    #[test]
    fn past_nonzero_score_completes_without_marker() {
        let markers = Markers::new(None, "");
        let (status, h, a) = classify(Some("2-1"), &markers, date(2025, 9, 1), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Completed);
        assert_eq!((h, a), (Some(2), Some(1)));
    }

    #[test]
    fn live_marker_wins_and_drops_scores() {
        let markers = Markers::new(Some("Live"), "match-row");
        let (status, h, a) = classify(Some("1-0"), &markers, date(2025, 9, 12), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::InProgress);
        assert_eq!((h, a), (None, None));
    }

    #[test]
    fn postponed_overrides_scores() {
        let markers = Markers::new(Some("Postponed"), "");
        let (status, h, a) = classify(Some("2-1"), &markers, date(2025, 9, 1), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Postponed);
        assert_eq!((h, a), (None, None));
    }

    #[test]
    fn cancelled_overrides_everything() {
        let markers = Markers::new(Some("Cancelled"), "match-row final");
        let (status, ..) = classify(Some("3-0"), &markers, date(2025, 9, 1), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Cancelled);
    }

    #[test]
    fn empty_cell_future_date_is_scheduled() {
        let markers = Markers::new(None, "match-row");
        let (status, ..) = classify(None, &markers, date(2025, 9, 20), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Scheduled);
    }

    #[test]
    fn empty_cell_today_is_scheduled() {
        let markers = Markers::new(None, "");
        let (status, ..) = classify(None, &markers, date(2025, 9, 12), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Scheduled);
    }

    #[test]
    fn empty_cell_past_date_is_tbd() {
        let markers = Markers::new(None, "");
        let (status, ..) = classify(None, &markers, date(2025, 9, 1), date(2025, 9, 12));
        assert_eq!(status, MatchStatus::Tbd);
    }

    #[test]
    fn ft_matches_only_as_a_word() {
        assert!(Markers::new(Some("FT"), "").is_final());
        assert!(Markers::new(Some("Full Time"), "").is_final());
        assert!(!Markers::new(Some("after"), "").is_final());
        assert!(!Markers::new(None, "draft-row").is_final());
    }
}
