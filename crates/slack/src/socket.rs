use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::blocks::parse_toggle_action_id;
use crate::events::{
    ChatResponse, EventContext, EventDispatcher, HandlerResult, SlackEnvelope, SlackEvent,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("transport send failed: {0}")]
    Send(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Delivers handler responses back to Slack: new messages to a channel,
/// replacements through the interaction's `response_url`.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn deliver(&self, response: &ChatResponse) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopResponseSink;

#[async_trait]
impl ResponseSink for NoopResponseSink {
    async fn deliver(&self, response: &ChatResponse) -> Result<(), TransportError> {
        debug!(text = %response.message().fallback_text, "dropping slack response");
        Ok(())
    }
}

/// Socket Mode event loop. Each envelope is acknowledged on receipt and then
/// dispatched on its own task. Finished tasks are joined while the loop waits
/// for the next envelope; tasks still running when the stream closes are
/// awaited before the transport disconnects.
pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: Arc<EventDispatcher>,
    sink: Arc<dyn ResponseSink>,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        sink: Arc<dyn ResponseSink>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher: Arc::new(dispatcher), sink, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "socket mode retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt, "socket mode transport connected");

        let mut in_flight = JoinSet::new();
        let outcome = self.pump(attempt, &mut in_flight).await;
        while let Some(joined) = in_flight.join_next().await {
            log_task_outcome(joined);
        }
        outcome?;

        self.transport.disconnect().await
    }

    async fn pump(&self, attempt: u32, in_flight: &mut JoinSet<()>) -> Result<(), TransportError> {
        loop {
            let read = self.transport.next_envelope();
            tokio::pin!(read);
            // Finished tasks are joined while the read is pending; the read itself is never cancelled.
            let next = loop {
                tokio::select! {
                    received = &mut read => break received?,
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        log_task_outcome(joined);
                    }
                }
            };
            let Some(envelope) = next else {
                info!(attempt, "socket mode transport stream closed");
                return Ok(());
            };
            let fields = CorrelationFields::from_envelope(&envelope);

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                reviewer_id = fields.reviewer_id.as_deref().unwrap_or("unknown"),
                interaction = fields.interaction.as_deref().unwrap_or("unknown"),
                "received slack envelope"
            );

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "acknowledged slack envelope"
                );
            }

            let dispatcher = Arc::clone(&self.dispatcher);
            let sink = Arc::clone(&self.sink);
            in_flight.spawn(async move {
                process_envelope(dispatcher.as_ref(), sink.as_ref(), envelope, fields).await;
            });
        }
    }
}

fn log_task_outcome(joined: Result<(), JoinError>) {
    if let Err(error) = joined {
        warn!(error = %error, "slack interaction task panicked or was cancelled");
    }
}

async fn process_envelope(
    dispatcher: &EventDispatcher,
    sink: &dyn ResponseSink,
    envelope: SlackEnvelope,
    fields: CorrelationFields,
) {
    let context = EventContext { correlation_id: envelope.envelope_id.clone() };
    let responses = match dispatcher.dispatch(&envelope, &context).await {
        Ok(HandlerResult::Responded(responses)) => responses,
        Ok(HandlerResult::Processed | HandlerResult::Ignored) => return,
        Err(error) => {
            warn!(
                envelope_id = %envelope.envelope_id,
                correlation_id = %context.correlation_id,
                reviewer_id = fields.reviewer_id.as_deref().unwrap_or("unknown"),
                interaction = fields.interaction.as_deref().unwrap_or("unknown"),
                error = %error,
                "event dispatch failed; continuing socket loop"
            );
            return;
        }
    };

    for response in &responses {
        if let Err(error) = sink.deliver(response).await {
            warn!(
                event_name = "egress.slack.response_failed",
                correlation_id = %context.correlation_id,
                reviewer_id = fields.reviewer_id.as_deref().unwrap_or("unknown"),
                error = %error,
                "failed to deliver slack response"
            );
        }
    }
}

/// Log fields identifying who an envelope concerns and which interaction it
/// carries, without decoding any action token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CorrelationFields {
    reviewer_id: Option<String>,
    interaction: Option<String>,
}

impl CorrelationFields {
    fn from_envelope(envelope: &SlackEnvelope) -> Self {
        match &envelope.event {
            SlackEvent::DialogSubmission(event) => Self {
                reviewer_id: event
                    .state
                    .clone()
                    .filter(|state| !state.trim().is_empty())
                    .or_else(|| non_empty(&event.user_id)),
                interaction: non_empty(&event.callback_id),
            },
            SlackEvent::BlockAction(event) => Self {
                reviewer_id: non_empty(&event.user_id),
                interaction: Some(match parse_toggle_action_id(&event.action_id) {
                    Some((plane, _)) => plane.as_str().to_string(),
                    None => event.action_id.clone(),
                }),
            },
            SlackEvent::Unsupported { .. } => Self::default(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
