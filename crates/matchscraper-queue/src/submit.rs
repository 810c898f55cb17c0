//! The `Submitter` capability and batch submission.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use matchscraper_utils::error::QueueError;
use matchscraper_utils::types::Match;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Task name carried in message headers. The consumer pattern-matches on
/// this exact string; it is part of the wire contract.
pub const TASK_NAME: &str = "celery_tasks.match_tasks.process_match_data";

/// Per-match publish outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub correlation_id: String,
    pub task_id: Option<Uuid>,
    pub success: bool,
    pub error: Option<String>,
}

impl SubmitResult {
    #[must_use]
    pub fn ok(correlation_id: String, task_id: Uuid) -> Self {
        Self {
            correlation_id,
            task_id: Some(task_id),
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(correlation_id: String, error: String) -> Self {
        Self {
            correlation_id,
            task_id: None,
            success: false,
            error: Some(error),
        }
    }
}

/// Publishing capability handed to the orchestrator.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Verify the broker connection is alive. Called once before any
    /// match events are emitted so an unreachable broker fails the run
    /// before the audit trail grows.
    async fn check_connection(&self) -> Result<(), QueueError>;

    /// Publish one match. Failures are reported in the result, never as an
    /// error: a single bad message must not abort the batch.
    async fn submit_one(&self, m: &Match) -> SubmitResult;

    /// Publish a batch; results are in input order.
    async fn submit_batch(&self, matches: &[Match]) -> Vec<SubmitResult>;
}

/// Drive `submit_one` over a batch with at most `max_in_flight` publishes
/// outstanding. Result order follows input order regardless of completion
/// order; consumers are idempotent on `external_match_id`, so no stronger
/// ordering is promised.
pub async fn submit_batch_bounded<S>(
    submitter: &S,
    matches: &[Match],
    max_in_flight: usize,
) -> Vec<SubmitResult>
where
    S: Submitter + ?Sized,
{
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let futures = matches.iter().map(|m| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            // Closed only on semaphore.close(), which we never call.
            let _permit = semaphore.acquire().await;
            submitter.submit_one(m).await
        }
    });
    join_all(futures).await
}
