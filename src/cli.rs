//! Command-line interface for matchscraper.

use std::str::FromStr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use matchscraper_audit::{ViewFilter, day_stats, filter_events, read_events, render_text};
use matchscraper_browser::BrowserSession;
use matchscraper_config::{Config, EnvConfig, ScrapeArgs};
use matchscraper_orchestrator::{Context, InterruptFlag, RunReport, run_scrape};
use matchscraper_queue::AmqpPublisher;
use matchscraper_utils::clock::{Clock, SystemClock};
use matchscraper_utils::error::ScraperError;
use matchscraper_utils::exit_codes::ExitCode;
use matchscraper_utils::logging::init_tracing;
use matchscraper_utils::types::{AgeGroup, League};
use tracing::debug;

/// matchscraper - scheduled scraper for MLS Next match listings
#[derive(Parser)]
#[command(name = "matchscraper")]
#[command(about = "Scrape MLS Next match listings, detect changes, and publish them to a broker")]
#[command(long_about = r#"
matchscraper drives the upstream schedule UI in a headless browser, applies
the configured league/age/division/date filters, and reconciles the results
against the previous run's snapshot. Every observation lands in a JSONL
audit trail; discovered and updated matches are published to RabbitMQ for
the downstream workers.

EXAMPLES:
  # Scrape one week of Homegrown U14 Northeast matches
  matchscraper scrape --league Homegrown --age-group U14 --division Northeast \
      --from 2025-09-12 --to 2025-09-19

  # Default window (today through +13 days), publish to a direct queue
  matchscraper scrape --league Homegrown --queue matches.prod

  # Scrape without publishing anything
  matchscraper scrape --league Academy --no-submit-queue

  # Inspect today's audit trail, changes only
  matchscraper audit view --changes-only

  # Per-day aggregate counters as JSON
  matchscraper audit stats --date 2025-09-12 --format json

CONFIGURATION:
  Values resolve with precedence: CLI flags > environment > defaults.
  Recognized environment variables: RABBITMQ_URL, AUDIT_DIR, STATE_FILE,
  LOG_LEVEL, HEADLESS, BROWSER_TIMEOUT.

EXIT CODES:
  0 success, 2 config error, 3 browser/extraction failure, 4 state lock
  conflict, 5 broker unavailable, 6 audit-write failure, 130 interrupted.
"#)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (stack traces, debug-level tracing)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one scrape: browse, filter, extract, detect changes, publish
    Scrape(ScrapeCommand),

    /// Inspect the JSONL audit trail
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Args)]
pub struct ScrapeCommand {
    /// League to scrape
    #[arg(long, value_parser = ["Homegrown", "Academy"])]
    pub league: String,

    /// Age group (default U14)
    #[arg(long, value_parser = ["U13", "U14", "U15", "U16", "U17", "U19"])]
    pub age_group: Option<String>,

    /// Division (default Northeast)
    #[arg(long)]
    pub division: Option<String>,

    /// Restrict to one club (type-ahead matched)
    #[arg(long)]
    pub club: Option<String>,

    /// Range start, YYYY-MM-DD (requires --to; wins over --start/--end)
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,

    /// Range end, YYYY-MM-DD
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,

    /// Range start as a day offset from today (negative = past, default 0)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "from")]
    pub start: Option<i64>,

    /// Range end as a day offset from today (default 13)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "to")]
    pub end: Option<i64>,

    /// Publish to this queue via the default exchange
    #[arg(long, conflicts_with = "exchange")]
    pub queue: Option<String>,

    /// Publish to this fanout exchange (default matches-fanout)
    #[arg(long)]
    pub exchange: Option<String>,

    /// Disable queue publishing entirely
    #[arg(long)]
    pub no_submit_queue: bool,

    /// Broker URL (overrides RABBITMQ_URL)
    #[arg(long)]
    pub broker_url: Option<String>,

    /// Run the browser headless (default)
    #[arg(long, overrides_with = "no_headless")]
    pub headless: bool,

    /// Run the browser with a visible window
    #[arg(long, overrides_with = "headless")]
    pub no_headless: bool,

    /// Per-browser-action timeout in milliseconds (default 30000)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Inter-action delay in milliseconds, for debugging
    #[arg(long)]
    pub slow: Option<u64>,

    /// Audit directory (overrides AUDIT_DIR)
    #[arg(long)]
    pub audit_dir: Option<Utf8PathBuf>,

    /// State file path (overrides STATE_FILE)
    #[arg(long)]
    pub state_file: Option<Utf8PathBuf>,

    /// Override a state lock left behind by a dead run
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Print audit events for one UTC day
    View {
        /// Day to read (default: today, UTC)
        #[arg(long, value_parser = parse_cli_date)]
        date: Option<NaiveDate>,

        /// Only events for this league
        #[arg(long, value_parser = ["Homegrown", "Academy"])]
        league: Option<String>,

        /// Only events of this type
        #[arg(long, value_parser = [
            "run_started", "run_completed", "match_discovered", "match_updated",
            "match_unchanged", "queue_submitted", "queue_failed",
        ])]
        event_type: Option<String>,

        /// Only events about this external match id
        #[arg(long)]
        match_id: Option<String>,

        /// Only events from this run
        #[arg(long)]
        run_id: Option<String>,

        /// Drop match_unchanged events
        #[arg(long)]
        changes_only: bool,

        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Aggregate per-day counters from the audit trail
    Stats {
        /// Day to aggregate (default: today, UTC)
        #[arg(long, value_parser = parse_cli_date)]
        date: Option<NaiveDate>,

        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("'{raw}' is not a YYYY-MM-DD date"))
}

impl ScrapeCommand {
    /// Lower the parsed flags into the resolver's input shape.
    fn into_args(self, verbose: bool) -> Result<ScrapeArgs, String> {
        let league = League::from_str(&self.league)
            .map_err(|_| format!("unknown league '{}'", self.league))?;
        let age_group = match &self.age_group {
            Some(raw) => Some(
                AgeGroup::from_str(raw).map_err(|_| format!("unknown age group '{raw}'"))?,
            ),
            None => None,
        };
        let headless = if self.headless {
            Some(true)
        } else if self.no_headless {
            Some(false)
        } else {
            None
        };
        Ok(ScrapeArgs {
            league: Some(league),
            age_group,
            division: self.division,
            club: self.club,
            from: self.from,
            to: self.to,
            start_offset: self.start,
            end_offset: self.end,
            queue: self.queue,
            exchange: self.exchange,
            no_submit_queue: self.no_submit_queue,
            broker_url: self.broker_url,
            headless,
            timeout_ms: self.timeout,
            slow_ms: self.slow,
            audit_dir: self.audit_dir,
            state_file: self.state_file,
            force: self.force,
            verbose,
        })
    }
}

/// Top-level entry point. Handles all output; the caller only maps the
/// returned code to `std::process::exit`.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape(cmd) => execute_scrape(cmd, cli.verbose).await,
        Commands::Audit { command } => execute_audit(command, cli.verbose),
    }
}

async fn execute_scrape(cmd: ScrapeCommand, verbose: bool) -> ExitCode {
    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("matchscraper: configuration error: {e}");
            return ExitCode::CONFIG;
        }
    };
    let args = match cmd.into_args(verbose) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("matchscraper: configuration error: {message}");
            return ExitCode::CONFIG;
        }
    };
    let config = match Config::resolve(args, &env, &SystemClock) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("matchscraper: configuration error: {e}");
            return ExitCode::CONFIG;
        }
    };

    let _ = init_tracing(config.verbose, config.log_level.as_deref());
    for (key, value, source) in config.effective() {
        debug!(key, value = %value, source, "effective config");
    }

    let ctx = Context::new(config);

    // Broker first: an unreachable broker should fail fast, before a
    // browser is ever launched.
    let publisher: Option<AmqpPublisher> = if ctx.config.submit_enabled() {
        let Some(url) = ctx.config.broker_url.clone() else {
            eprintln!("matchscraper: configuration error: broker URL missing");
            return ExitCode::CONFIG;
        };
        match AmqpPublisher::connect(&url, &ctx.config.routing, Arc::clone(&ctx.ids)).await {
            Ok(publisher) => Some(publisher),
            Err(e) => {
                eprintln!("matchscraper: {e}");
                return ScraperError::from(e).to_exit_code();
            }
        }
    } else {
        None
    };

    let session = match BrowserSession::launch(
        ctx.config.headless,
        ctx.config.action_timeout_ms,
        ctx.config.slow_motion_ms,
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            eprintln!("matchscraper: {e}");
            return ScraperError::from(e).to_exit_code();
        }
    };
    let mut session = session;

    let interrupt = InterruptFlag::armed();
    let (report, error) =
        run_scrape(&ctx, &mut session.page, publisher.as_ref(), &interrupt).await;
    session.shutdown().await;

    print_summary(&report, error.as_ref());
    match error {
        None => ExitCode::SUCCESS,
        Some(e) => {
            if verbose {
                eprintln!("matchscraper: {e:?}");
            }
            e.to_exit_code()
        }
    }
}

/// The compact stderr line every run ends with, success or not.
fn print_summary(report: &RunReport, error: Option<&ScraperError>) {
    let s = &report.summary;
    let status = match error {
        None => "ok".to_string(),
        Some(e) => format!("failed ({e})"),
    };
    eprintln!(
        "run {} {}: total={} discovered={} updated={} unchanged={} submitted={} failed={} exit={}",
        report.run_id,
        status,
        s.total_matches,
        s.discovered,
        s.updated,
        s.unchanged,
        s.queue_submitted,
        s.queue_failed,
        error.map_or(ExitCode::SUCCESS, ScraperError::to_exit_code),
    );
}

fn execute_audit(command: AuditCommands, verbose: bool) -> ExitCode {
    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("matchscraper: configuration error: {e}");
            return ExitCode::CONFIG;
        }
    };
    let audit_dir = env
        .audit_dir
        .unwrap_or_else(|| Utf8PathBuf::from(matchscraper_utils::paths::DEFAULT_AUDIT_DIR));

    match command {
        AuditCommands::View {
            date,
            league,
            event_type,
            match_id,
            run_id,
            changes_only,
            format,
        } => {
            let day = date.unwrap_or_else(|| SystemClock.now_utc().date_naive());
            let league = match league.as_deref().map(League::from_str) {
                Some(Ok(league)) => Some(league),
                Some(Err(_)) => {
                    eprintln!("matchscraper: configuration error: unknown league");
                    return ExitCode::CONFIG;
                }
                None => None,
            };
            let events = match read_events(&audit_dir, day) {
                Ok(events) => events,
                Err(e) => {
                    eprintln!("matchscraper: {e}");
                    if verbose {
                        eprintln!("matchscraper: {e:?}");
                    }
                    return ScraperError::from(e).to_exit_code();
                }
            };
            let filter = ViewFilter {
                league,
                event_type,
                match_id,
                run_id,
                changes_only,
            };
            let filtered = filter_events(events, &filter);
            if format == "json" {
                match serde_json::to_string_pretty(&filtered) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("matchscraper: failed to render events: {e}");
                        return ExitCode::INTERNAL;
                    }
                }
            } else {
                for event in &filtered {
                    println!("{}", render_text(event));
                }
                eprintln!("{} event(s) for {day}", filtered.len());
            }
            ExitCode::SUCCESS
        }
        AuditCommands::Stats { date, format } => {
            let day = date.unwrap_or_else(|| SystemClock.now_utc().date_naive());
            let events = match read_events(&audit_dir, day) {
                Ok(events) => events,
                Err(e) => {
                    eprintln!("matchscraper: {e}");
                    return ScraperError::from(e).to_exit_code();
                }
            };
            let stats = day_stats(&events);
            if format == "json" {
                match serde_json::to_string_pretty(&stats) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("matchscraper: failed to render stats: {e}");
                        return ExitCode::INTERNAL;
                    }
                }
            } else {
                println!("audit stats for {day}");
                println!("  runs started:    {}", stats.runs_started);
                println!(
                    "  runs completed:  {} ({} failed)",
                    stats.runs_completed, stats.runs_failed
                );
                println!("  discovered:      {}", stats.discovered);
                println!("  updated:         {}", stats.updated);
                println!("  unchanged:       {}", stats.unchanged);
                println!("  queue submitted: {}", stats.queue_submitted);
                println!("  queue failed:    {}", stats.queue_failed);
                println!("  distinct matches:{}", stats.distinct_matches);
            }
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn scrape_requires_a_league() {
        assert!(parse(&["matchscraper", "scrape"]).is_err());
        assert!(parse(&["matchscraper", "scrape", "--league", "Homegrown"]).is_ok());
        assert!(parse(&["matchscraper", "scrape", "--league", "Premier"]).is_err());
    }

    #[test]
    fn queue_and_exchange_conflict_at_parse_time() {
        let result = parse(&[
            "matchscraper",
            "scrape",
            "--league",
            "Homegrown",
            "--queue",
            "matches.prod",
            "--exchange",
            "matches-fanout",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn absolute_dates_conflict_with_offsets() {
        let result = parse(&[
            "matchscraper",
            "scrape",
            "--league",
            "Homegrown",
            "--from",
            "2025-09-12",
            "--start",
            "-7",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_offsets_parse() {
        let cli = parse(&[
            "matchscraper",
            "scrape",
            "--league",
            "Homegrown",
            "--start",
            "-7",
            "--end",
            "0",
        ])
        .unwrap();
        let Commands::Scrape(cmd) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(cmd.start, Some(-7));
        assert_eq!(cmd.end, Some(0));
    }

    #[test]
    fn headless_flags_lower_to_tristate() {
        let cli = parse(&["matchscraper", "scrape", "--league", "Homegrown"]).unwrap();
        let Commands::Scrape(cmd) = cli.command else {
            panic!("expected scrape");
        };
        let args = cmd.into_args(false).unwrap();
        assert_eq!(args.headless, None);

        let cli = parse(&[
            "matchscraper",
            "scrape",
            "--league",
            "Homegrown",
            "--no-headless",
        ])
        .unwrap();
        let Commands::Scrape(cmd) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(cmd.into_args(false).unwrap().headless, Some(false));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let result = parse(&[
            "matchscraper",
            "scrape",
            "--league",
            "Homegrown",
            "--from",
            "09/12/2025",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn audit_view_accepts_all_documented_filters() {
        let cli = parse(&[
            "matchscraper",
            "audit",
            "view",
            "--date",
            "2025-09-12",
            "--league",
            "Homegrown",
            "--event-type",
            "match_updated",
            "--match-id",
            "100436",
            "--run-id",
            "20250912-060000-abc123",
            "--changes-only",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Audit {
            command:
                AuditCommands::View {
                    date,
                    changes_only,
                    format,
                    ..
                },
        } = cli.command
        else {
            panic!("expected audit view");
        };
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(2025, 9, 12).unwrap()));
        assert!(changes_only);
        assert_eq!(format, "json");
    }

    #[test]
    fn audit_stats_defaults_to_text() {
        let cli = parse(&["matchscraper", "audit", "stats"]).unwrap();
        let Commands::Audit {
            command: AuditCommands::Stats { date, format },
        } = cli.command
        else {
            panic!("expected audit stats");
        };
        assert_eq!(date, None);
        assert_eq!(format, "text");
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result = parse(&[
            "matchscraper",
            "audit",
            "view",
            "--event-type",
            "match_exploded",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn league_lowering_maps_to_the_enum() {
        let cli = parse(&["matchscraper", "scrape", "--league", "Academy"]).unwrap();
        let Commands::Scrape(cmd) = cli.command else {
            panic!("expected scrape");
        };
        let args = cmd.into_args(true).unwrap();
        assert_eq!(args.league, Some(League::Academy));
        assert!(args.verbose);
    }
}
