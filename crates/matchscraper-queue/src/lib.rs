//! matchscraper-queue - broker publishing
//!
//! Publishes discovered and updated matches to an AMQP 0.9.1 broker with
//! at-least-once semantics: publisher confirms are awaited, every match is
//! re-validated immediately before publish, and an invalid or failed
//! message is counted rather than poisoning the rest of the batch.
//!
//! Connection retry with exponential backoff lives here and only here;
//! every other component of the pipeline fails fast.

mod amqp;
mod submit;

pub use amqp::AmqpPublisher;
pub use submit::{SubmitResult, Submitter, TASK_NAME, submit_batch_bounded};
