//! matchscraper-browser - browser capability and WebDriver driver
//!
//! The rest of the pipeline drives the upstream schedule UI exclusively
//! through the [`BrowserPage`] capability: a small, synchronous-looking set
//! of DOM operations. The production implementation
//! ([`WebDriverPage`](driver::WebDriverPage)) talks to chromedriver through
//! fantoccini; tests use scripted fakes.
//!
//! Everything the upstream site forces on us lives here: the consent
//! overlay, the `main[role="main"]` landmark, and the single nested
//! `<iframe>` that carries the actual schedule widget. After
//! [`BrowserPage::enter_schedule_iframe`] succeeds, all selectors resolve
//! inside the iframe's document.

pub mod driver;
pub mod page;
pub mod selectors;

pub use driver::{BrowserSession, WebDriverPage};
pub use page::{BrowserPage, RawMatchRecord, ResultsLayout, ResultsSnapshot};
