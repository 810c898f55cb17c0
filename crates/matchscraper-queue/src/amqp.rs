//! lapin-backed AMQP publisher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, publisher_confirm::Confirmation};
use matchscraper_config::Routing;
use matchscraper_utils::clock::IdGen;
use matchscraper_utils::error::QueueError;
use matchscraper_utils::types::Match;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::submit::{SubmitResult, Submitter, TASK_NAME, submit_batch_bounded};

/// Connection retry schedule: initial 1s, factor 2, capped at 30s.
const RETRY_ATTEMPTS: u32 = 5;
const RETRY_INITIAL: Duration = Duration::from_secs(1);
const RETRY_CAP: Duration = Duration::from_secs(30);

/// Concurrent publishes per batch.
const DEFAULT_FAN_OUT: usize = 4;

/// Delay before the `attempt`-th retry (0-based).
fn backoff_delay(attempt: u32) -> Duration {
    let exp = RETRY_INITIAL.saturating_mul(2u32.saturating_pow(attempt));
    exp.min(RETRY_CAP)
}

/// `(exchange, routing_key)` for a routing target.
///
/// Direct queues publish through the default exchange with the queue name
/// as routing key; fanout exchanges take an empty key and let the broker
/// duplicate to every bound queue.
fn routing_parts(routing: &Routing) -> Option<(String, String)> {
    match routing {
        Routing::Fanout { exchange } => Some((exchange.clone(), String::new())),
        Routing::DirectQueue { queue } => Some((String::new(), queue.clone())),
        Routing::Disabled => None,
    }
}

/// Publisher over a confirmed lapin channel.
pub struct AmqpPublisher {
    connection: Connection,
    channel: Channel,
    exchange: String,
    routing_key: String,
    fan_out: usize,
    ids: Arc<dyn IdGen>,
}

impl AmqpPublisher {
    /// Connect with exponential backoff, open a channel, and enable
    /// publisher confirms. Topology (exchange/queue declarations) is
    /// provisioned out-of-band and deliberately not asserted here.
    pub async fn connect(
        url: &str,
        routing: &Routing,
        ids: Arc<dyn IdGen>,
    ) -> Result<Self, QueueError> {
        let Some((exchange, routing_key)) = routing_parts(routing) else {
            return Err(QueueError::Unavailable {
                attempts: 0,
                last_error: "publishing is disabled for this run".to_string(),
            });
        };

        let mut last_error = String::new();
        for attempt in 0..RETRY_ATTEMPTS {
            match Connection::connect(url, ConnectionProperties::default()).await {
                Ok(connection) => {
                    let channel = connection.create_channel().await.map_err(|e| {
                        QueueError::Unavailable {
                            attempts: attempt + 1,
                            last_error: format!("channel open failed: {e}"),
                        }
                    })?;
                    channel
                        .confirm_select(ConfirmSelectOptions::default())
                        .await
                        .map_err(|e| QueueError::Unavailable {
                            attempts: attempt + 1,
                            last_error: format!("confirm select failed: {e}"),
                        })?;
                    debug!(exchange = %exchange, routing_key = %routing_key, "broker connected");
                    return Ok(Self {
                        connection,
                        channel,
                        exchange,
                        routing_key,
                        fan_out: DEFAULT_FAN_OUT,
                        ids,
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt + 1 < RETRY_ATTEMPTS {
                        let delay = backoff_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            delay_secs = delay.as_secs(),
                            error = %last_error,
                            "broker connect failed; backing off"
                        );
                        sleep(delay).await;
                    }
                }
            }
        }
        Err(QueueError::Unavailable {
            attempts: RETRY_ATTEMPTS,
            last_error,
        })
    }

    /// Serialize a match to its wire body.
    fn message_body(m: &Match) -> Result<Vec<u8>, QueueError> {
        serde_json::to_vec(m).map_err(|e| QueueError::InvalidMessage {
            correlation_id: m.external_match_id.clone(),
            reason: e.to_string(),
        })
    }

    /// Message properties: persistent JSON with the Celery task headers.
    fn properties(task_id: Uuid, correlation_id: &str) -> BasicProperties {
        let mut headers = FieldTable::default();
        headers.insert(
            ShortString::from("task"),
            AMQPValue::LongString(TASK_NAME.into()),
        );
        headers.insert(
            ShortString::from("id"),
            AMQPValue::LongString(task_id.to_string().into()),
        );
        BasicProperties::default()
            .with_headers(headers)
            .with_content_type(ShortString::from("application/json"))
            .with_content_encoding(ShortString::from("utf-8"))
            .with_delivery_mode(2)
            .with_message_id(ShortString::from(task_id.to_string()))
            .with_correlation_id(ShortString::from(correlation_id))
    }

    async fn publish(&self, m: &Match) -> Result<Uuid, QueueError> {
        // Re-validate at the boundary; a record that mutated since
        // extraction must not reach the broker.
        m.validate().map_err(|e| QueueError::InvalidMessage {
            correlation_id: m.external_match_id.clone(),
            reason: e.to_string(),
        })?;

        let task_id = self.ids.task_id();
        let body = Self::message_body(m)?;

        let confirm = self
            .channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &body,
                Self::properties(task_id, &m.external_match_id),
            )
            .await
            .map_err(|e| QueueError::PublishFailed {
                correlation_id: m.external_match_id.clone(),
                reason: e.to_string(),
            })?
            .await
            .map_err(|e| QueueError::PublishFailed {
                correlation_id: m.external_match_id.clone(),
                reason: e.to_string(),
            })?;

        match confirm {
            Confirmation::Ack(_) | Confirmation::NotRequested => Ok(task_id),
            Confirmation::Nack(_) => Err(QueueError::PublishFailed {
                correlation_id: m.external_match_id.clone(),
                reason: "broker nacked the publish".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Submitter for AmqpPublisher {
    async fn check_connection(&self) -> Result<(), QueueError> {
        if self.connection.status().connected() {
            Ok(())
        } else {
            Err(QueueError::Unavailable {
                attempts: 0,
                last_error: "connection lost".to_string(),
            })
        }
    }

    async fn submit_one(&self, m: &Match) -> SubmitResult {
        match self.publish(m).await {
            Ok(task_id) => SubmitResult::ok(m.external_match_id.clone(), task_id),
            Err(e) => {
                warn!(correlation_id = %m.external_match_id, error = %e, "publish failed");
                SubmitResult::failed(m.external_match_id.clone(), e.to_string())
            }
        }
    }

    async fn submit_batch(&self, matches: &[Match]) -> Vec<SubmitResult> {
        submit_batch_bounded(self, matches, self.fan_out).await
    }
}
