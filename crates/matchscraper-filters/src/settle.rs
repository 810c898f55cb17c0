//! Results-container settle detection.
//!
//! After the last filter is applied the upstream widget re-queries its
//! backend asynchronously. Rather than trusting an optimistic sleep, the
//! engine polls a cheap signature of the results container (row count plus
//! first-row text) and considers it settled once the signature has been
//! quiet for a full window.

use std::time::Duration;

use matchscraper_browser::page::BrowserPage;
use matchscraper_browser::selectors;
use matchscraper_utils::error::ScraperError;
use tokio::time::sleep;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Signature of the current results: `(record count, first record text)`.
async fn signature<P: BrowserPage + ?Sized>(
    page: &mut P,
) -> Result<(usize, String), ScraperError> {
    let rows = page.texts_of(selectors::RESULTS_ROWS).await?;
    if !rows.is_empty() {
        return Ok((rows.len(), rows[0].clone()));
    }
    let cards = page.texts_of(selectors::MATCH_CARDS).await?;
    let first = cards.first().cloned().unwrap_or_default();
    Ok((cards.len(), first))
}

/// Wait until the results container has been quiet for `quiet_ms`.
///
/// Gives up (successfully) after `max_ms`: a container that never goes
/// quiet is handed to the extractor as-is rather than failing the run.
pub async fn wait_for_settle<P: BrowserPage + ?Sized>(
    page: &mut P,
    quiet_ms: u64,
    max_ms: u64,
) -> Result<(), ScraperError> {
    let mut last = signature(page).await?;
    let mut quiet = Duration::ZERO;
    let mut elapsed = Duration::ZERO;
    let quiet_target = Duration::from_millis(quiet_ms);
    let max = Duration::from_millis(max_ms);

    while elapsed < max {
        sleep(POLL_INTERVAL).await;
        elapsed += POLL_INTERVAL;

        let current = signature(page).await?;
        if current == last {
            quiet += POLL_INTERVAL;
            if quiet >= quiet_target {
                debug!(rows = current.0, "results container settled");
                return Ok(());
            }
        } else {
            quiet = Duration::ZERO;
            last = current;
        }
    }
    debug!("results container never went quiet; proceeding with current state");
    Ok(())
}

/// Watch for the container to change away from `baseline` within `max_ms`.
/// Used to decide whether the direct date-input fill actually refreshed the
/// widget, or whether the calendar fallback is needed.
pub(crate) async fn refreshed_from<P: BrowserPage + ?Sized>(
    page: &mut P,
    baseline: &(usize, String),
    max_ms: u64,
) -> Result<bool, ScraperError> {
    let mut elapsed = Duration::ZERO;
    let max = Duration::from_millis(max_ms);
    while elapsed < max {
        sleep(POLL_INTERVAL).await;
        elapsed += POLL_INTERVAL;
        if signature(page).await? != *baseline {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Snapshot the current signature for later comparison.
pub(crate) async fn baseline<P: BrowserPage + ?Sized>(
    page: &mut P,
) -> Result<(usize, String), ScraperError> {
    signature(page).await
}
