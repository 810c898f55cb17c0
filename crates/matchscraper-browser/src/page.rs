//! The `BrowserPage` capability.
//!
//! Whether the implementation uses cooperative suspension over a WebDriver
//! session or a scripted fake is invisible to the filter engine and the
//! extractor; only this trait crosses the component boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use matchscraper_utils::error::BrowserError;

/// How the results container rendered its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsLayout {
    /// `<table>` with header-named columns, one row per match.
    Table,
    /// Card tiles with labeled sub-elements.
    Cards,
}

/// One raw match row or card, as read from the DOM before any parsing.
///
/// `fields` is keyed by lower-cased header name in table mode (`home`,
/// `away`, `date`, `time`, `score`, `venue`, `status`) and by the card
/// field labels in card mode. `attributes` carries the row element's
/// `data-*` attributes; `markers` is its `class` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMatchRecord {
    pub fields: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
    pub markers: String,
}

impl RawMatchRecord {
    /// Convenience lookup returning a trimmed, non-empty field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Everything the extractor needs from one read of the results container.
#[derive(Debug, Clone)]
pub struct ResultsSnapshot {
    pub layout: ResultsLayout,
    pub records: Vec<RawMatchRecord>,
    /// Match count the container itself reports, when it announces one.
    /// Used to detect a batch-wide extraction failure.
    pub reported_count: Option<usize>,
}

/// Synchronous-looking DOM operations over the schedule UI.
///
/// All methods are bounded by the configured per-action timeout; a method
/// that cannot complete within it returns
/// [`BrowserError::ActionTimeout`](matchscraper_utils::error::BrowserError).
#[async_trait]
pub trait BrowserPage: Send {
    /// Load a URL in the top-level browsing context.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Dismiss any consent/cookie overlay. No-op when none is present.
    async fn dismiss_consent(&mut self) -> Result<(), BrowserError>;

    /// Attach to the schedule iframe under `main[role="main"]`. All
    /// subsequent selectors resolve inside the iframe document.
    async fn enter_schedule_iframe(&mut self) -> Result<(), BrowserError>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Clear the first element matching `selector` and type `text` into it.
    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Send an Enter keypress to the first element matching `selector`.
    async fn press_enter(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Wait until `selector` matches at least one element.
    async fn wait_for(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Whether `selector` currently matches any element. Never waits.
    async fn exists(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Trimmed text of the first element matching `selector`.
    async fn text_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Trimmed texts of every element matching `selector`, in DOM order.
    async fn texts_of(&mut self, selector: &str) -> Result<Vec<String>, BrowserError>;

    /// Click the option under `options_selector` whose text equals (or, if
    /// no exact match exists, contains) `value`, case-insensitively.
    /// Returns the list of option texts when no option matched.
    async fn click_option(
        &mut self,
        options_selector: &str,
        value: &str,
    ) -> Result<Result<(), Vec<String>>, BrowserError>;

    /// Read the results container: layout, raw records, and the reported
    /// match count if the container announces one.
    async fn read_results(&mut self) -> Result<ResultsSnapshot, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_trims_and_drops_empties() {
        let mut record = RawMatchRecord::default();
        record.fields.insert("home".to_string(), "  IFA  ".to_string());
        record.fields.insert("venue".to_string(), "   ".to_string());
        assert_eq!(record.field("home"), Some("IFA"));
        assert_eq!(record.field("venue"), None);
        assert_eq!(record.field("away"), None);
    }
}
