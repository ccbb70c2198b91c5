//! Consumers of the gateway's response queues.

use actors::{Correlated, CorrelationTable};
use relay_core::{ProcessingResult, ProcessingState, QueueName, wire};
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use transport::{Broker, Subscription};

use crate::error::GatewayError;

/// Tasks feeding `outputs` and `status-response` into the correlation tables.
pub struct ResponseListener {
    consumers: JoinSet<QueueName>,
}

impl ResponseListener {
    pub async fn start<B: Broker>(
        broker: &B,
        results: CorrelationTable<ProcessingResult>,
        states: CorrelationTable<ProcessingState>,
    ) -> Result<Self, GatewayError> {
        let outputs = broker.subscribe(QueueName::Outputs).await?;
        let status_responses = broker.subscribe(QueueName::StatusResponse).await?;

        let mut consumers = JoinSet::new();
        consumers.spawn(resolve_from(outputs, results));
        consumers.spawn(resolve_from(status_responses, states));
        Ok(Self { consumers })
    }

    /// Wait until both consumers have been cancelled.
    pub async fn closed(mut self) {
        while let Some(joined) = self.consumers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Response consumer failed: {}", e);
            }
        }
    }

    pub fn abort(&mut self) {
        self.consumers.abort_all();
    }
}

async fn resolve_from<R>(mut subscription: Subscription, table: CorrelationTable<R>) -> QueueName
where
    R: Correlated + DeserializeOwned,
{
    let queue = subscription.queue();
    while let Some(delivery) = subscription.next().await {
        match wire::decode::<R>(&delivery.data) {
            Ok(response) => {
                tracing::debug!("Received {}: {:?}", R::KIND, response);
                if let Err(e) = table.resolve(response) {
                    tracing::error!("{}", e);
                }
            }
            Err(e) => tracing::warn!("Discarding message on {}: {}", queue, e),
        }
        if let Err(e) = delivery.ack().await {
            tracing::error!("{}", e);
        }
    }
    tracing::warn!("Consumer for {} cancelled by broker", queue);
    queue
}
