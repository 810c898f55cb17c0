//! Run context: resolved config plus injectable clock and id generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use matchscraper_config::Config;
use matchscraper_utils::clock::{Clock, IdGen, RandomIdGen, SystemClock};
use matchscraper_utils::error::ScraperError;

/// Everything a run needs, threaded through construction rather than held
/// in process-wide singletons.
pub struct Context {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGen>,
}

impl Context {
    /// Production context with the system clock and thread RNG.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIdGen),
        }
    }

    /// Context with pinned time/id sources, for deterministic tests.
    #[must_use]
    pub fn with_sources(config: Config, clock: Arc<dyn Clock>, ids: Arc<dyn IdGen>) -> Self {
        Self { config, clock, ids }
    }
}

/// Cooperative cancellation flag.
///
/// The pipeline checks it between stages: the current browser action or
/// in-flight publish completes, state is not persisted, and audit events
/// already written remain.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the flag from Ctrl-C. Spawns a background listener.
    #[must_use]
    pub fn armed() -> Self {
        let flag = Self::new();
        let inner = Arc::clone(&flag.0);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                inner.store(true, Ordering::SeqCst);
            }
        });
        flag
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Error out at a stage boundary when an interrupt is pending.
    pub fn check(&self) -> Result<(), ScraperError> {
        if self.is_set() {
            Err(ScraperError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_flag_trips_once_triggered() {
        let flag = InterruptFlag::new();
        assert!(flag.check().is_ok());
        flag.trigger();
        assert!(matches!(flag.check(), Err(ScraperError::Interrupted)));
        // Clones observe the same state.
        let clone = flag.clone();
        assert!(clone.is_set());
    }
}
