//! Two-pane calendar navigation.
//!
//! The date-range widget shows two month panes. The left pane is navigated
//! to the range start's month and the right pane, independently, to the
//! range end's month; cross-month ranges therefore advance the right pane
//! on its own. Day cells are clicked start-first.

use chrono::{Datelike, NaiveDate};
use matchscraper_browser::page::BrowserPage;
use matchscraper_browser::selectors;
use matchscraper_utils::error::{FilterError, ScraperError};
use tracing::debug;

/// Upper bound on pane navigation clicks. The widget never offers more
/// than two years of schedule.
const MAX_MONTH_STEPS: u32 = 24;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parse a pane's month label, e.g. `September 2025` or `Sep 2025`.
pub(crate) fn parse_month_label(label: &str) -> Option<(i32, u32)> {
    let mut parts = label.split_whitespace();
    let month_raw = parts.next()?.to_ascii_lowercase();
    let year: i32 = parts.next()?.parse().ok()?;
    let month = MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&month_raw) || month_raw.starts_with(name))?
        as u32
        + 1;
    Some((year, month))
}

fn month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Months from `from` to `to`, negative when `to` is earlier.
fn months_between(from: (i32, u32), to: (i32, u32)) -> i32 {
    (to.0 - from.0) * 12 + to.1 as i32 - from.1 as i32
}

/// Select `from..=to` via the calendar widget. The date input has already
/// been clicked, so the widget is open.
pub(crate) async fn select_range<P: BrowserPage + ?Sized>(
    page: &mut P,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(), ScraperError> {
    page.wait_for(selectors::CALENDAR).await?;

    navigate_pane(
        page,
        "left",
        selectors::CALENDAR_LEFT_MONTH,
        selectors::CALENDAR_LEFT_PREV,
        selectors::CALENDAR_LEFT_NEXT,
        month_of(from),
    )
    .await?;

    let cross_month = month_of(from) != month_of(to);
    if cross_month {
        // The right pane moves with its own navigation so the start month
        // stays visible on the left.
        navigate_pane(
            page,
            "right",
            selectors::CALENDAR_RIGHT_MONTH,
            selectors::CALENDAR_LEFT_PREV,
            selectors::CALENDAR_RIGHT_NEXT,
            month_of(to),
        )
        .await?;
    }

    click_day(page, selectors::CALENDAR_LEFT_PANE, from).await?;
    let to_pane = if cross_month {
        selectors::CALENDAR_RIGHT_PANE
    } else {
        selectors::CALENDAR_LEFT_PANE
    };
    click_day(page, to_pane, to).await?;

    // Some widget skins require an explicit apply; absence is fine.
    if page.exists(selectors::CALENDAR_APPLY).await? {
        page.click(selectors::CALENDAR_APPLY).await?;
    }
    Ok(())
}

/// Step one pane until its month label matches `target`.
async fn navigate_pane<P: BrowserPage + ?Sized>(
    page: &mut P,
    pane: &str,
    month_selector: &str,
    prev_selector: &str,
    next_selector: &str,
    target: (i32, u32),
) -> Result<(), ScraperError> {
    for _ in 0..MAX_MONTH_STEPS {
        let label = page.text_of(month_selector).await?.ok_or_else(|| {
            FilterError::Unavailable {
                filter: "date_range".to_string(),
                selector: month_selector.to_string(),
            }
        })?;
        let current = parse_month_label(&label).ok_or_else(|| FilterError::Unavailable {
            filter: "date_range".to_string(),
            selector: month_selector.to_string(),
        })?;

        let delta = months_between(current, target);
        if delta == 0 {
            debug!(pane, label = %label, "calendar pane on target month");
            return Ok(());
        }
        let step = if delta > 0 { next_selector } else { prev_selector };
        page.click(step).await?;
    }
    Err(FilterError::Unavailable {
        filter: "date_range".to_string(),
        selector: month_selector.to_string(),
    }
    .into())
}

/// Click the day-number cell for `date` inside `pane`.
async fn click_day<P: BrowserPage + ?Sized>(
    page: &mut P,
    pane: &str,
    date: NaiveDate,
) -> Result<(), ScraperError> {
    let cells = format!("{pane} {}", selectors::CALENDAR_DAY_CELLS);
    let day = date.day().to_string();
    match page.click_option(&cells, &day).await? {
        Ok(()) => Ok(()),
        Err(available) => Err(FilterError::Rejected {
            filter: "date_range".to_string(),
            requested: date.format("%Y-%m-%d").to_string(),
            available: available.join(", "),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_labels_parse_full_and_abbreviated() {
        assert_eq!(parse_month_label("September 2025"), Some((2025, 9)));
        assert_eq!(parse_month_label("Sep 2025"), Some((2025, 9)));
        assert_eq!(parse_month_label("NOVEMBER 2025"), Some((2025, 11)));
        assert_eq!(parse_month_label("2025"), None);
        assert_eq!(parse_month_label("Smarch 2025"), None);
    }

    #[test]
    fn month_distance_is_signed() {
        assert_eq!(months_between((2025, 10), (2025, 11)), 1);
        assert_eq!(months_between((2025, 12), (2026, 1)), 1);
        assert_eq!(months_between((2025, 11), (2025, 10)), -1);
        assert_eq!(months_between((2025, 10), (2025, 10)), 0);
    }
}
