//! CSS selectors for the upstream schedule UI.
//!
//! These are the contract with the third-party page. They are grouped here
//! so a markup change upstream is a one-file fix.

/// Accept buttons for consent/cookie overlays, tried in order. Absence of
/// all of them is a no-op.
pub const CONSENT_ACCEPT: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "#truste-consent-button",
    "button.osano-cm-accept-all",
    "button[aria-label*='Accept']",
    ".cookie-banner button.accept",
];

/// The single schedule iframe under the page's main landmark.
pub const SCHEDULE_IFRAME: &str = "main[role='main'] iframe";

/// Age-group dropdown (an enhanced `<select>` carrying the `js-age` hook).
pub const AGE_DROPDOWN: &str = "div.dropdown.js-age";
pub const AGE_TOGGLE: &str = "div.dropdown.js-age .dropdown-toggle";
pub const AGE_OPTIONS: &str = "div.dropdown.js-age .dropdown-menu li";
pub const AGE_LABEL: &str = "div.dropdown.js-age .dropdown-toggle .filter-label";

/// Division dropdown.
pub const DIVISION_TOGGLE: &str = "div.dropdown.js-division .dropdown-toggle";
pub const DIVISION_OPTIONS: &str = "div.dropdown.js-division .dropdown-menu li";
pub const DIVISION_LABEL: &str = "div.dropdown.js-division .dropdown-toggle .filter-label";

/// Club dropdown with its type-ahead search box.
pub const CLUB_TOGGLE: &str = "div.dropdown.js-club .dropdown-toggle";
pub const CLUB_SEARCH: &str = "div.dropdown.js-club input[type='search']";
pub const CLUB_OPTIONS: &str = "div.dropdown.js-club .dropdown-menu li";
pub const CLUB_LABEL: &str = "div.dropdown.js-club .dropdown-toggle .filter-label";

/// Date-range text input; focusing it opens the two-pane calendar.
pub const DATE_INPUT: &str = "input.js-daterange";
pub const CALENDAR: &str = ".daterangepicker";
pub const CALENDAR_LEFT_MONTH: &str = ".daterangepicker .drp-calendar.left .month";
pub const CALENDAR_RIGHT_MONTH: &str = ".daterangepicker .drp-calendar.right .month";
pub const CALENDAR_LEFT_PREV: &str = ".daterangepicker .drp-calendar.left .prev";
pub const CALENDAR_LEFT_NEXT: &str = ".daterangepicker .drp-calendar.left .next";
pub const CALENDAR_RIGHT_NEXT: &str = ".daterangepicker .drp-calendar.right .next";
pub const CALENDAR_APPLY: &str = ".daterangepicker .applyBtn";

/// Day cell inside one calendar pane; combined with the pane selector.
pub const CALENDAR_DAY_CELLS: &str = "td.available";
pub const CALENDAR_LEFT_PANE: &str = ".daterangepicker .drp-calendar.left";
pub const CALENDAR_RIGHT_PANE: &str = ".daterangepicker .drp-calendar.right";

/// Results container, table layout.
pub const RESULTS_CONTAINER: &str = ".schedule-results";
pub const RESULTS_TABLE: &str = ".schedule-results table";
pub const RESULTS_HEADERS: &str = ".schedule-results table thead th";
pub const RESULTS_ROWS: &str = ".schedule-results table tbody tr";

/// Results container, card layout (mobile-style tiles).
pub const MATCH_CARDS: &str = ".schedule-results .match-card";

/// Labeled sub-elements inside one card, `(field, selector)` pairs.
pub const CARD_FIELDS: &[(&str, &str)] = &[
    ("home_team", ".team-home .team-name"),
    ("away_team", ".team-away .team-name"),
    ("date", ".match-date"),
    ("time", ".match-time"),
    ("score", ".match-score"),
    ("venue", ".match-venue"),
    ("status", ".match-status"),
];

/// Element announcing how many matches the container holds, e.g.
/// "Showing 15 matches".
pub const RESULTS_COUNT: &str = ".schedule-results .results-count";
