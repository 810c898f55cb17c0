//! Injectable clock and id generation.
//!
//! Run ids, audit timestamps, and date-offset resolution all go through
//! these capabilities so tests can pin time and randomness.

use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use uuid::Uuid;

/// Time source for the pipeline.
pub trait Clock: Send + Sync {
    /// Current instant in UTC. Audit event timestamps use this.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Today's local calendar date. Offset-based date ranges resolve
    /// against this.
    fn today(&self) -> NaiveDate;
}

/// Randomness source for run suffixes and queue task ids.
pub trait IdGen: Send + Sync {
    /// 6-character lowercase alphanumeric run-id suffix.
    fn run_suffix(&self) -> String;

    /// RFC-4122 v4 UUID for a queue task.
    fn task_id(&self) -> Uuid;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Thread-RNG implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGen;

impl IdGen for RandomIdGen {
    fn run_suffix(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect()
    }

    fn task_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Generate a run id of the form `YYYYMMDD-HHMMSS-<6-char-random>`.
///
/// The timestamp half is the UTC instant the run started; the suffix keeps
/// ids unique when runs start within the same second.
#[must_use]
pub fn new_run_id(clock: &dyn Clock, ids: &dyn IdGen) -> String {
    format!(
        "{}-{}",
        clock.now_utc().format("%Y%m%d-%H%M%S"),
        ids.run_suffix()
    )
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    //! Deterministic clock and id generator for unit tests.

    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use chrono::TimeZone;

    /// Clock pinned to a fixed instant.
    #[derive(Debug)]
    pub struct FixedClock(pub DateTime<Utc>);

    impl FixedClock {
        #[must_use]
        pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Self {
            Self(Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap())
        }
    }

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.0
        }

        fn today(&self) -> NaiveDate {
            self.0.date_naive()
        }
    }

    /// Id generator producing a counting sequence.
    #[derive(Debug, Default)]
    pub struct SequentialIdGen(AtomicU64);

    impl IdGen for SequentialIdGen {
        fn run_suffix(&self) -> String {
            format!("t{:05}", self.0.fetch_add(1, Ordering::Relaxed))
        }

        fn task_id(&self) -> Uuid {
            let n = self.0.fetch_add(1, Ordering::Relaxed);
            Uuid::from_u128(u128::from(n) + 1)
        }
    }
}
