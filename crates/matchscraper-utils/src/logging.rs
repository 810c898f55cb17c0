//! Tracing initialization for the CLI.

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used: stdout is a TTY and `NO_COLOR`
/// is not set.
fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// Filter precedence: `RUST_LOG` if set, then `log_level` (the `LOG_LEVEL`
/// environment variable resolved by config), then a default of `info` for
/// matchscraper crates (`debug` with `--verbose`).
pub fn init_tracing(verbose: bool, log_level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let default_directive = if verbose {
        "matchscraper=debug,info"
    } else {
        "matchscraper=info,warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| match log_level {
            Some(level) => EnvFilter::try_new(level),
            None => EnvFilter::try_new(default_directive),
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(use_color())
                    .with_target(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}
