//! The filter application engine.

use chrono::NaiveDate;
use matchscraper_browser::page::BrowserPage;
use matchscraper_browser::selectors;
use matchscraper_utils::error::{FilterError, ScraperError};
use matchscraper_utils::types::AgeGroup;
use tracing::debug;

use crate::calendar;
use crate::settle;

/// Per-filter lifecycle. Transitions are recorded for diagnostics; a filter
/// that never reaches `Verified` produces the error explaining why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Idle,
    Opening,
    Selecting,
    Applied,
    Verified,
}

/// What to apply, in UI dependency order.
#[derive(Debug, Clone)]
pub struct FilterPlan {
    pub age_group: AgeGroup,
    pub division: String,
    pub club: Option<String>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Quiet window for settle detection.
    pub settle_quiet_ms: u64,
    /// Ceiling for settle and refresh detection.
    pub settle_max_ms: u64,
}

impl FilterPlan {
    /// Plan with the standard settle windows: 2s quiet within the given
    /// ceiling.
    #[must_use]
    pub fn new(
        age_group: AgeGroup,
        division: String,
        club: Option<String>,
        from: NaiveDate,
        to: NaiveDate,
        settle_max_ms: u64,
    ) -> Self {
        Self {
            age_group,
            division,
            club,
            from,
            to,
            settle_quiet_ms: 2_000,
            settle_max_ms,
        }
    }
}

/// Applies a [`FilterPlan`] through a [`BrowserPage`], recording state
/// transitions.
pub struct FilterEngine {
    plan: FilterPlan,
    transitions: Vec<(&'static str, FilterState)>,
}

impl FilterEngine {
    #[must_use]
    pub fn new(plan: FilterPlan) -> Self {
        Self {
            plan,
            transitions: Vec::new(),
        }
    }

    /// Recorded `(filter, state)` transitions, in order.
    #[must_use]
    pub fn transitions(&self) -> &[(&'static str, FilterState)] {
        &self.transitions
    }

    fn note(&mut self, filter: &'static str, state: FilterState) {
        debug!(filter, ?state, "filter transition");
        self.transitions.push((filter, state));
    }

    /// Apply every filter in dependency order, then wait for the results
    /// container to settle.
    pub async fn apply<P: BrowserPage + ?Sized>(
        &mut self,
        page: &mut P,
    ) -> Result<(), ScraperError> {
        let age_label = self.plan.age_group.to_string();
        self.apply_dropdown(
            page,
            "age_group",
            selectors::AGE_TOGGLE,
            selectors::AGE_OPTIONS,
            selectors::AGE_LABEL,
            &age_label,
        )
        .await?;

        let division = self.plan.division.clone();
        self.apply_dropdown(
            page,
            "division",
            selectors::DIVISION_TOGGLE,
            selectors::DIVISION_OPTIONS,
            selectors::DIVISION_LABEL,
            &division,
        )
        .await?;

        if let Some(club) = self.plan.club.clone() {
            self.apply_club(page, &club).await?;
        }

        self.apply_date_range(page).await?;

        settle::wait_for_settle(page, self.plan.settle_quiet_ms, self.plan.settle_max_ms).await
    }

    /// One dropdown through the full state machine.
    async fn apply_dropdown<P: BrowserPage + ?Sized>(
        &mut self,
        page: &mut P,
        filter: &'static str,
        toggle: &str,
        options: &str,
        label: &str,
        value: &str,
    ) -> Result<(), ScraperError> {
        self.note(filter, FilterState::Idle);

        self.note(filter, FilterState::Opening);
        page.click(toggle).await.map_err(|_| FilterError::Unavailable {
            filter: filter.to_string(),
            selector: toggle.to_string(),
        })?;

        self.note(filter, FilterState::Selecting);
        match page.click_option(options, value).await? {
            Ok(()) => {}
            Err(available) => {
                return Err(FilterError::Rejected {
                    filter: filter.to_string(),
                    requested: value.to_string(),
                    available: available.join(", "),
                }
                .into());
            }
        }
        self.note(filter, FilterState::Applied);

        self.verify_label(page, filter, label, value).await?;
        self.note(filter, FilterState::Verified);
        Ok(())
    }

    /// Club is optional and searched rather than scrolled: the option list
    /// can hold hundreds of entries and is rewritten whenever the age group
    /// changes.
    async fn apply_club<P: BrowserPage + ?Sized>(
        &mut self,
        page: &mut P,
        club: &str,
    ) -> Result<(), ScraperError> {
        self.note("club", FilterState::Idle);

        self.note("club", FilterState::Opening);
        page.click(selectors::CLUB_TOGGLE)
            .await
            .map_err(|_| FilterError::Unavailable {
                filter: "club".to_string(),
                selector: selectors::CLUB_TOGGLE.to_string(),
            })?;

        self.note("club", FilterState::Selecting);
        page.fill(selectors::CLUB_SEARCH, club).await?;
        // Give the type-ahead a moment to filter its option list.
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        match page.click_option(selectors::CLUB_OPTIONS, club).await? {
            Ok(()) => {}
            Err(available) => {
                return Err(FilterError::Rejected {
                    filter: "club".to_string(),
                    requested: club.to_string(),
                    available: available.join(", "),
                }
                .into());
            }
        }
        self.note("club", FilterState::Applied);

        self.verify_label(page, "club", selectors::CLUB_LABEL, club)
            .await?;
        self.note("club", FilterState::Verified);
        Ok(())
    }

    /// Date range, direct fill first, calendar fallback second.
    async fn apply_date_range<P: BrowserPage + ?Sized>(
        &mut self,
        page: &mut P,
    ) -> Result<(), ScraperError> {
        self.note("date_range", FilterState::Idle);

        let literal = format!(
            "{} - {}",
            self.plan.from.format("%m/%d/%Y"),
            self.plan.to.format("%m/%d/%Y")
        );

        self.note("date_range", FilterState::Opening);
        let baseline = settle::baseline(page).await?;

        self.note("date_range", FilterState::Selecting);
        page.fill(selectors::DATE_INPUT, &literal).await?;
        page.press_enter(selectors::DATE_INPUT).await?;

        let refresh_window = self.plan.settle_quiet_ms.max(1_000);
        if !settle::refreshed_from(page, &baseline, refresh_window).await? {
            debug!("direct date fill produced no refresh; falling back to calendar");
            page.click(selectors::DATE_INPUT).await?;
            calendar::select_range(page, self.plan.from, self.plan.to).await?;
        }
        self.note("date_range", FilterState::Applied);
        self.note("date_range", FilterState::Verified);
        Ok(())
    }

    /// Read the dropdown's visible label back and require it to mention the
    /// applied value.
    async fn verify_label<P: BrowserPage + ?Sized>(
        &mut self,
        page: &mut P,
        filter: &'static str,
        label_selector: &str,
        expected: &str,
    ) -> Result<(), ScraperError> {
        let actual = page.text_of(label_selector).await?.ok_or_else(|| {
            FilterError::Unavailable {
                filter: filter.to_string(),
                selector: label_selector.to_string(),
            }
        })?;
        if actual
            .to_ascii_lowercase()
            .contains(&expected.to_ascii_lowercase())
        {
            Ok(())
        } else {
            Err(FilterError::VerificationFailed {
                filter: filter.to_string(),
                expected: expected.to_string(),
                actual,
            }
            .into())
        }
    }
}
