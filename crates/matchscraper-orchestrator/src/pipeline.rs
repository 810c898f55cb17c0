//! The scrape pipeline.

use matchscraper_audit::{AuditEvent, AuditWriter, RunMetadata, RunSummary};
use matchscraper_browser::page::BrowserPage;
use matchscraper_extract::{ExtractionContext, Extractor, TeamNameNormalizer};
use matchscraper_filters::{FilterEngine, FilterPlan};
use matchscraper_queue::Submitter;
use matchscraper_state::{StateStore, detect_changes};
use matchscraper_utils::clock::new_run_id;
use matchscraper_utils::error::{QueueError, ScraperError};
use matchscraper_utils::types::Match;
use tracing::{info, warn};

use crate::context::{Context, InterruptFlag};

/// What a finished (or failed-but-audited) run reports to the CLI.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub summary: RunSummary,
    pub success: bool,
}

/// Execute one scrape run end to end.
///
/// `submitter` is `None` when publishing is disabled. The report is always
/// returned alongside the error that stops the run, if any: a failed run
/// still carries the counters it accumulated, so the CLI can end with its
/// summary line. Only an audit failure skips the final `run_completed`
/// event, since once appends fail no further append can be trusted.
pub async fn run_scrape<P, S>(
    ctx: &Context,
    page: &mut P,
    submitter: Option<&S>,
    interrupt: &InterruptFlag,
) -> (RunReport, Option<ScraperError>)
where
    P: BrowserPage + ?Sized,
    S: Submitter + ?Sized,
{
    let run_id = new_run_id(ctx.clock.as_ref(), ctx.ids.as_ref());
    let metadata = RunMetadata {
        league: ctx.config.league,
        age_group: ctx.config.age_group,
        division: ctx.config.division.clone(),
        date_range: ctx.config.date_range.label(),
    };

    let mut summary = RunSummary::default();
    let mut audit = AuditWriter::new(&ctx.config.audit_dir);
    if let Err(e) = audit.append(&AuditEvent::RunStarted {
        timestamp: ctx.clock.now_utc(),
        run_id: run_id.clone(),
        run_metadata: metadata.clone(),
    }) {
        let report = RunReport {
            run_id,
            summary,
            success: false,
        };
        return (report, Some(e.into()));
    }
    info!(run_id = %run_id, range = %metadata.date_range, "run started");

    let mut result =
        run_stages(ctx, page, submitter, interrupt, &run_id, &mut audit, &mut summary).await;

    let success = result.is_ok();
    // An audit failure means we cannot trust further appends either.
    if !matches!(result, Err(ScraperError::Audit(_))) {
        let completed = audit.append(&AuditEvent::RunCompleted {
            timestamp: ctx.clock.now_utc(),
            run_id: run_id.clone(),
            run_metadata: metadata,
            summary,
            success,
        });
        if let (Err(e), Ok(())) = (completed, &result) {
            result = Err(e.into());
        }
    }

    if result.is_ok() {
        info!(run_id = %run_id, ?summary, "run completed");
    }
    let success = result.is_ok();
    let report = RunReport {
        run_id,
        summary,
        success,
    };
    (report, result.err())
}

/// Stages 2-7 of the pipeline; counters accumulate in `summary` so a
/// failed run still reports what it managed to do.
async fn run_stages<P, S>(
    ctx: &Context,
    page: &mut P,
    submitter: Option<&S>,
    interrupt: &InterruptFlag,
    run_id: &str,
    audit: &mut AuditWriter,
    summary: &mut RunSummary,
) -> Result<(), ScraperError>
where
    P: BrowserPage + ?Sized,
    S: Submitter + ?Sized,
{
    // Broker reachability is verified before any match events exist so an
    // unreachable broker leaves no half-told story in the audit trail.
    if ctx.config.submit_enabled() {
        let Some(submitter) = submitter else {
            return Err(QueueError::Unavailable {
                attempts: 0,
                last_error: "no publisher constructed for an enabled queue target".to_string(),
            }
            .into());
        };
        submitter.check_connection().await?;
    }

    let store = StateStore::open(&ctx.config.state_file, run_id, ctx.config.force_lock)?;
    let prior = store.load()?;
    interrupt.check()?;

    let observed = scrape(ctx, page).await?;
    summary.total_matches = observed.len();
    interrupt.check()?;

    let outcome = detect_changes(&prior, &observed);
    summary.discovered = outcome.discovered.len();
    summary.updated = outcome.updated.len();
    summary.unchanged = outcome.unchanged.len();

    for m in &outcome.discovered {
        audit.append(&AuditEvent::MatchDiscovered {
            timestamp: ctx.clock.now_utc(),
            run_id: run_id.to_string(),
            correlation_id: m.external_match_id.clone(),
            match_data: m.clone(),
        })?;
    }
    for (m, changes) in &outcome.updated {
        audit.append(&AuditEvent::MatchUpdated {
            timestamp: ctx.clock.now_utc(),
            run_id: run_id.to_string(),
            correlation_id: m.external_match_id.clone(),
            match_data: m.clone(),
            changes: changes.clone(),
        })?;
    }
    for m in &outcome.unchanged {
        audit.append(&AuditEvent::MatchUnchanged {
            timestamp: ctx.clock.now_utc(),
            run_id: run_id.to_string(),
            correlation_id: m.external_match_id.clone(),
            match_data: m.clone(),
        })?;
    }

    if ctx.config.submit_enabled()
        && let Some(submitter) = submitter
    {
        let to_publish: Vec<Match> = outcome
            .discovered
            .iter()
            .chain(outcome.updated.iter().map(|(m, _)| m))
            .cloned()
            .collect();

        if !to_publish.is_empty() {
            interrupt.check()?;
            let results = submitter.submit_batch(&to_publish).await;
            for result in results {
                if result.success {
                    summary.queue_submitted += 1;
                    audit.append(&AuditEvent::QueueSubmitted {
                        timestamp: ctx.clock.now_utc(),
                        run_id: run_id.to_string(),
                        correlation_id: result.correlation_id,
                        queue_task_id: result.task_id.unwrap_or_default(),
                        queue_success: true,
                    })?;
                } else {
                    summary.queue_failed += 1;
                    warn!(
                        correlation_id = %result.correlation_id,
                        "queue submission failed"
                    );
                    audit.append(&AuditEvent::QueueFailed {
                        timestamp: ctx.clock.now_utc(),
                        run_id: run_id.to_string(),
                        correlation_id: result.correlation_id,
                        queue_task_id: None,
                        queue_success: false,
                        error_message: result
                            .error
                            .unwrap_or_else(|| "unknown publish failure".to_string()),
                    })?;
                }
            }
        }
    }

    // Interrupted runs deliberately skip persistence: the next run
    // re-classifies the same matches instead of trusting a torn state.
    interrupt.check()?;
    store.persist(&outcome.snapshot)?;
    Ok(())
}

/// Stage 3: drive the browser through navigation, filters, and extraction.
async fn scrape<P>(ctx: &Context, page: &mut P) -> Result<Vec<Match>, ScraperError>
where
    P: BrowserPage + ?Sized,
{
    page.navigate(ctx.config.league.schedule_url()).await?;
    page.dismiss_consent().await?;
    page.enter_schedule_iframe().await?;

    let plan = FilterPlan::new(
        ctx.config.age_group,
        ctx.config.division.clone(),
        ctx.config.club.clone(),
        ctx.config.date_range.from,
        ctx.config.date_range.to,
        ctx.config.action_timeout_ms,
    );
    FilterEngine::new(plan).apply(page).await?;

    let snapshot = page.read_results().await?;
    let extractor = Extractor::new(
        ExtractionContext {
            league: ctx.config.league,
            age_group: ctx.config.age_group,
            division: ctx.config.division.clone(),
            season: ctx.config.season.clone(),
            range_from: ctx.config.date_range.from,
            range_to: ctx.config.date_range.to,
            today: ctx.clock.today(),
        },
        TeamNameNormalizer::default(),
    );
    let report = extractor.extract(&snapshot)?;
    if report.skipped > 0 {
        warn!(skipped = report.skipped, "some rows were unparseable");
    }
    Ok(report.matches)
}
