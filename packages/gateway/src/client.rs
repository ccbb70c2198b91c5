//! Gateway-side operations over the broker.

use std::time::Duration;

use actors::{CorrelationError, CorrelationTable, start_correlation};
use relay_core::{ProcessingInput, ProcessingResult, ProcessingState, QueueName, wire};
use transport::Broker;

use crate::error::GatewayError;
use crate::listener::ResponseListener;

/// Publishes requests for the worker and awaits the correlated answers.
pub struct GatewayClient<B: Broker> {
    broker: B,
    results: CorrelationTable<ProcessingResult>,
    states: CorrelationTable<ProcessingState>,
}

impl<B: Broker> Clone for GatewayClient<B> {
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            results: self.results.clone(),
            states: self.states.clone(),
        }
    }
}

impl<B: Broker> GatewayClient<B> {
    /// Start the correlation tables and the response listener on `broker`.
    ///
    /// Requests without an answer fail after `response_timeout`.
    pub async fn start(
        broker: B,
        response_timeout: Duration,
    ) -> Result<(Self, ResponseListener), GatewayError> {
        let (results, _) = start_correlation::<ProcessingResult>(response_timeout).await?;
        let (states, _) = start_correlation::<ProcessingState>(response_timeout).await?;

        let listener =
            match ResponseListener::start(&broker, results.clone(), states.clone()).await {
                Ok(listener) => listener,
                Err(e) => {
                    results.shutdown();
                    states.shutdown();
                    return Err(e);
                }
            };

        tracing::info!("Gateway attached to {} broker", broker.name());
        Ok((
            Self {
                broker,
                results,
                states,
            },
            listener,
        ))
    }

    /// Publish `input` and wait for its result.
    pub async fn process_sync(
        &self,
        input: ProcessingInput,
    ) -> Result<ProcessingResult, GatewayError> {
        let payload = wire::encode(&input)?;
        let result = self
            .results
            .register_and_send(&input.id, || self.broker.publish(QueueName::Inputs, payload))
            .await?;
        Ok(result)
    }

    /// Publish `input` without waiting. The result only shows up through status queries.
    ///
    /// Refused while a sync request for the same id waits, since the worker's
    /// duplicate rejection would otherwise answer that request.
    pub async fn process_async(&self, input: ProcessingInput) -> Result<(), GatewayError> {
        if self.results.is_pending(&input.id).await? {
            return Err(CorrelationError::AlreadyPending(input.id).into());
        }
        let payload = wire::encode(&input)?;
        self.broker.publish(QueueName::Inputs, payload).await?;
        Ok(())
    }

    /// Ask the worker for the state of `id`.
    pub async fn request_status(&self, id: &str) -> Result<ProcessingState, GatewayError> {
        let state = self
            .states
            .register_and_send(id, || {
                self.broker
                    .publish(QueueName::StatusRequest, wire::encode_identifier(id))
            })
            .await?;
        Ok(state)
    }

    pub async fn clear(&self) -> Result<(), GatewayError> {
        self.broker.publish(QueueName::Clear, wire::signal()).await?;
        Ok(())
    }

    pub async fn terminate(&self) -> Result<(), GatewayError> {
        self.broker
            .publish(QueueName::Terminate, wire::signal())
            .await?;
        Ok(())
    }

    /// Requests still waiting for an answer, as (results, states).
    pub async fn pending(&self) -> Result<(usize, usize), GatewayError> {
        Ok((self.results.pending().await?, self.states.pending().await?))
    }

    /// Stop the correlation tables. Waiting requests fail.
    pub fn shutdown(&self) {
        self.results.shutdown();
        self.states.shutdown();
    }
}
