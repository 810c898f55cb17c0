//! WebDriver-backed implementation of [`BrowserPage`].
//!
//! Drives a headless Chrome through chromedriver. The driver binary is
//! spawned as a child process on a local port unless `WEBDRIVER_URL` points
//! at an externally managed endpoint.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::key::Key;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use matchscraper_utils::error::BrowserError;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::page::{BrowserPage, RawMatchRecord, ResultsLayout, ResultsSnapshot};
use crate::selectors;

const DRIVER_PORT: u16 = 9515;
const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_DELAY: Duration = Duration::from_millis(250);

fn wd_err(e: fantoccini::error::CmdError) -> BrowserError {
    BrowserError::Webdriver {
        reason: e.to_string(),
    }
}

/// A running browser: the chromedriver child (when we spawned it) plus the
/// attached [`WebDriverPage`].
pub struct BrowserSession {
    driver: Option<Child>,
    pub page: WebDriverPage,
}

impl BrowserSession {
    /// Spawn chromedriver (unless `WEBDRIVER_URL` is set), connect, and
    /// open a session with the requested headless mode.
    pub async fn launch(
        headless: bool,
        action_timeout_ms: u64,
        slow_motion_ms: u64,
    ) -> Result<Self, BrowserError> {
        let (driver, endpoint) = match std::env::var("WEBDRIVER_URL") {
            Ok(url) if !url.trim().is_empty() => (None, url),
            _ => {
                let child = Command::new("chromedriver")
                    .arg(format!("--port={DRIVER_PORT}"))
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                    .map_err(|e| BrowserError::LaunchFailed {
                        reason: format!("failed to spawn chromedriver: {e}"),
                    })?;
                (Some(child), format!("http://localhost:{DRIVER_PORT}"))
            }
        };

        let mut args = vec![
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if headless {
            args.push("--headless=new".to_string());
        }
        let caps: Capabilities = serde_json::from_value(serde_json::json!({
            "goog:chromeOptions": { "args": args }
        }))
        .map_err(|e| BrowserError::LaunchFailed {
            reason: format!("invalid capabilities: {e}"),
        })?;

        let client = connect_with_retry(&endpoint, caps).await?;
        debug!(endpoint = %endpoint, headless, "browser session established");

        Ok(Self {
            driver,
            page: WebDriverPage {
                client,
                timeout: Duration::from_millis(action_timeout_ms),
                slow_motion: Duration::from_millis(slow_motion_ms),
            },
        })
    }

    /// Close the WebDriver session and kill a spawned chromedriver.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.page.client.close().await {
            warn!(error = %e, "failed to close WebDriver session");
        }
        if let Some(mut child) = self.driver.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

async fn connect_with_retry(
    endpoint: &str,
    caps: Capabilities,
) -> Result<Client, BrowserError> {
    let mut last_error = String::new();
    for attempt in 0..CONNECT_ATTEMPTS {
        match ClientBuilder::rustls()
            .map_err(|e| BrowserError::LaunchFailed {
                reason: format!("TLS initialization failed: {e}"),
            })?
            .capabilities(caps.clone())
            .connect(endpoint)
            .await
        {
            Ok(client) => return Ok(client),
            Err(e) => {
                last_error = e.to_string();
                debug!(attempt, error = %last_error, "WebDriver not ready yet");
                sleep(CONNECT_DELAY).await;
            }
        }
    }
    Err(BrowserError::LaunchFailed {
        reason: format!("WebDriver at {endpoint} not reachable: {last_error}"),
    })
}

/// [`BrowserPage`] over a live fantoccini client.
pub struct WebDriverPage {
    client: Client,
    timeout: Duration,
    slow_motion: Duration,
}

impl WebDriverPage {
    async fn pace(&self) {
        if !self.slow_motion.is_zero() {
            sleep(self.slow_motion).await;
        }
    }

    fn timeout_err(&self, action: &str) -> BrowserError {
        BrowserError::ActionTimeout {
            action: action.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    async fn find_one(&mut self, selector: &str) -> Result<Option<Element>, BrowserError> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(el) => Ok(Some(el)),
            Err(fantoccini::error::CmdError::Standard(fantoccini::error::WebDriver {
                error: fantoccini::error::ErrorStatus::NoSuchElement,
                ..
            })) => Ok(None),
            Err(e) => Err(wd_err(e)),
        }
    }

    async fn read_table(&mut self) -> Result<ResultsSnapshot, BrowserError> {
        let headers: Vec<String> = {
            let els = self
                .client
                .find_all(Locator::Css(selectors::RESULTS_HEADERS))
                .await
                .map_err(wd_err)?;
            let mut out = Vec::with_capacity(els.len());
            for el in els {
                out.push(canonical_header(&el.text().await.map_err(wd_err)?));
            }
            out
        };

        let rows = self
            .client
            .find_all(Locator::Css(selectors::RESULTS_ROWS))
            .await
            .map_err(wd_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = RawMatchRecord::default();
            let cells = row.find_all(Locator::Css("td")).await.map_err(wd_err)?;
            for (i, cell) in cells.into_iter().enumerate() {
                let text = cell.text().await.map_err(wd_err)?;
                let key = headers
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("col{i}"));
                record.fields.insert(key, text.trim().to_string());
            }
            fill_row_metadata(&row, &mut record).await?;
            records.push(record);
        }

        Ok(ResultsSnapshot {
            layout: ResultsLayout::Table,
            records,
            reported_count: self.reported_count().await?,
        })
    }

    async fn read_cards(&mut self) -> Result<ResultsSnapshot, BrowserError> {
        let cards = self
            .client
            .find_all(Locator::Css(selectors::MATCH_CARDS))
            .await
            .map_err(wd_err)?;

        let mut records = Vec::with_capacity(cards.len());
        for card in cards {
            let mut record = RawMatchRecord::default();
            for (field, sel) in selectors::CARD_FIELDS {
                if let Ok(el) = card.find(Locator::Css(sel)).await {
                    let text = el.text().await.map_err(wd_err)?;
                    record
                        .fields
                        .insert((*field).to_string(), text.trim().to_string());
                }
            }
            fill_row_metadata(&card, &mut record).await?;
            records.push(record);
        }

        Ok(ResultsSnapshot {
            layout: ResultsLayout::Cards,
            records,
            reported_count: self.reported_count().await?,
        })
    }

    /// Wait for `selector` to appear, bounded by the action timeout.
    /// The error is opaque; callers attach their own context.
    async fn await_element(&mut self, selector: &str) -> Result<Element, ()> {
        let timeout = self.timeout;
        let waited = tokio::time::timeout(
            timeout,
            self.client
                .wait()
                .at_most(timeout)
                .for_element(Locator::Css(selector)),
        )
        .await;
        match waited {
            Ok(Ok(el)) => Ok(el),
            _ => Err(()),
        }
    }

    async fn reported_count(&mut self) -> Result<Option<usize>, BrowserError> {
        let Some(el) = self.find_one(selectors::RESULTS_COUNT).await? else {
            return Ok(None);
        };
        let text = el.text().await.map_err(wd_err)?;
        Ok(first_integer(&text))
    }
}

/// Copy the row/card element's identifying metadata into the record.
async fn fill_row_metadata(
    el: &Element,
    record: &mut RawMatchRecord,
) -> Result<(), BrowserError> {
    if let Some(id) = el.attr("data-match-id").await.map_err(wd_err)? {
        record
            .attributes
            .insert("data-match-id".to_string(), id);
    }
    record.markers = el
        .attr("class")
        .await
        .map_err(wd_err)?
        .unwrap_or_default();
    Ok(())
}

/// Normalize a table header to a canonical field key.
fn canonical_header(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    if lower.contains("home") {
        "home_team".to_string()
    } else if lower.contains("away") || lower.contains("opponent") {
        "away_team".to_string()
    } else if lower.contains("date") {
        "date".to_string()
    } else if lower.contains("time") {
        "time".to_string()
    } else if lower.contains("score") || lower.contains("result") {
        "score".to_string()
    } else if lower.contains("venue") || lower.contains("location") || lower.contains("field") {
        "venue".to_string()
    } else if lower.contains("status") {
        "status".to_string()
    } else {
        lower
    }
}

/// First run of ASCII digits in `text`, as a count.
fn first_integer(text: &str) -> Option<usize> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let result = tokio::time::timeout(self.timeout, self.client.goto(url)).await;
        let Ok(result) = result else {
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            });
        };
        result.map_err(wd_err)?;
        self.pace().await;
        Ok(())
    }

    async fn dismiss_consent(&mut self) -> Result<(), BrowserError> {
        for selector in selectors::CONSENT_ACCEPT {
            if let Some(el) = self.find_one(selector).await? {
                debug!(selector, "dismissing consent overlay");
                // The overlay may already be animating out; a failed click
                // here is not fatal.
                if let Err(e) = el.click().await {
                    debug!(selector, error = %e, "consent click failed");
                }
                self.pace().await;
                return Ok(());
            }
        }
        Ok(())
    }

    async fn enter_schedule_iframe(&mut self) -> Result<(), BrowserError> {
        let found = self.await_element(selectors::SCHEDULE_IFRAME).await;
        let frame = found.map_err(|_| BrowserError::IframeNotFound)?;
        frame.enter_frame().await.map_err(wd_err)?;
        self.pace().await;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let found = self.await_element(selector).await;
        let el = found.map_err(|_| self.timeout_err(&format!("click {selector}")))?;
        el.click().await.map_err(wd_err)?;
        self.pace().await;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let found = self.await_element(selector).await;
        let el = found.map_err(|_| self.timeout_err(&format!("fill {selector}")))?;
        el.clear().await.map_err(wd_err)?;
        el.send_keys(text).await.map_err(wd_err)?;
        self.pace().await;
        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> Result<(), BrowserError> {
        let el = self
            .find_one(selector)
            .await?
            .ok_or_else(|| self.timeout_err(&format!("press_enter {selector}")))?;
        let enter: char = Key::Enter.into();
        el.send_keys(&enter.to_string()).await.map_err(wd_err)?;
        self.pace().await;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str) -> Result<(), BrowserError> {
        let found = self.await_element(selector).await;
        found
            .map(|_| ())
            .map_err(|_| self.timeout_err(&format!("wait_for {selector}")))
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.find_one(selector).await?.is_some())
    }

    async fn text_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        match self.find_one(selector).await? {
            Some(el) => {
                let text = el.text().await.map_err(wd_err)?;
                Ok(Some(text.trim().to_string()))
            }
            None => Ok(None),
        }
    }

    async fn texts_of(&mut self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let els = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(wd_err)?;
        let mut out = Vec::with_capacity(els.len());
        for el in els {
            out.push(el.text().await.map_err(wd_err)?.trim().to_string());
        }
        Ok(out)
    }

    async fn click_option(
        &mut self,
        options_selector: &str,
        value: &str,
    ) -> Result<Result<(), Vec<String>>, BrowserError> {
        let mut els = self
            .client
            .find_all(Locator::Css(options_selector))
            .await
            .map_err(wd_err)?;

        let mut texts = Vec::with_capacity(els.len());
        for el in &els {
            texts.push(el.text().await.map_err(wd_err)?.trim().to_string());
        }

        let wanted = value.trim().to_ascii_lowercase();
        let exact = texts
            .iter()
            .position(|t| t.to_ascii_lowercase() == wanted);
        let chosen = exact.or_else(|| {
            texts
                .iter()
                .position(|t| t.to_ascii_lowercase().contains(&wanted))
        });

        match chosen {
            Some(i) => {
                // Element::click consumes the element.
                els.swap_remove(i).click().await.map_err(wd_err)?;
                self.pace().await;
                Ok(Ok(()))
            }
            None => Ok(Err(texts)),
        }
    }

    async fn read_results(&mut self) -> Result<ResultsSnapshot, BrowserError> {
        if self.exists(selectors::RESULTS_TABLE).await? {
            self.read_table().await
        } else {
            self.read_cards().await
        }
    }
}
