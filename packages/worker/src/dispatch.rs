//! Worker-side queue consumption.
//!
//! One task per inbound queue decodes each delivery into a `WorkerEvent`,
//! hands it to the `EventHandler`, and acknowledges it. Handlers only start
//! work; results travel back through the broker on their own.

use std::sync::Arc;

use relay_core::{ProcessingInput, QueueName, wire};
use tokio::task::JoinSet;
use transport::{Broker, Delivery, Subscription};

use crate::error::DispatchError;

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Input(ProcessingInput),
    StatusRequest(String),
    Clear,
    Terminate,
}

impl WorkerEvent {
    /// Decode a payload received on `queue`.
    pub fn decode(queue: QueueName, data: &[u8]) -> Result<Self, DispatchError> {
        match queue {
            QueueName::Inputs => Ok(WorkerEvent::Input(wire::decode(data)?)),
            QueueName::StatusRequest => Ok(WorkerEvent::StatusRequest(wire::decode_identifier(
                data,
            )?)),
            QueueName::Clear => Ok(WorkerEvent::Clear),
            QueueName::Terminate => Ok(WorkerEvent::Terminate),
            other => Err(DispatchError::UnexpectedQueue(other)),
        }
    }
}

/// Callbacks for inbound worker events.
///
/// Calls must return promptly; long work belongs on spawned tasks.
pub trait EventHandler: Send + Sync + 'static {
    fn on_input(&self, input: ProcessingInput);
    fn on_status_request(&self, id: String);
    fn on_clear(&self);
    fn on_terminate(&self);

    fn handle(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::Input(input) => self.on_input(input),
            WorkerEvent::StatusRequest(id) => self.on_status_request(id),
            WorkerEvent::Clear => self.on_clear(),
            WorkerEvent::Terminate => self.on_terminate(),
        }
    }
}

/// Running consumers of the worker's inbound queues.
pub struct EventDispatcher {
    consumers: JoinSet<QueueName>,
}

impl EventDispatcher {
    /// Subscribe to every worker queue and start dispatching to `handler`.
    pub async fn start<B, H>(broker: &B, handler: Arc<H>) -> Result<Self, DispatchError>
    where
        B: Broker,
        H: EventHandler,
    {
        let mut subscriptions = Vec::with_capacity(QueueName::WORKER_INBOUND.len());
        for queue in QueueName::WORKER_INBOUND {
            subscriptions.push(broker.subscribe(queue).await?);
        }

        let mut consumers = JoinSet::new();
        for subscription in subscriptions {
            let handler = handler.clone();
            consumers.spawn(consume(subscription, handler));
        }

        tracing::info!(
            "Worker consuming {} queues on {} broker",
            consumers.len(),
            broker.name()
        );
        Ok(Self { consumers })
    }

    /// Wait until every consumer has been cancelled.
    pub async fn closed(mut self) {
        while let Some(joined) = self.consumers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Consumer task failed: {}", e);
            }
        }
    }

    /// Stop consuming.
    pub fn abort(&mut self) {
        self.consumers.abort_all();
    }
}

async fn consume<H: EventHandler>(mut subscription: Subscription, handler: Arc<H>) -> QueueName {
    let queue = subscription.queue();
    while let Some(delivery) = subscription.next().await {
        dispatch(delivery, handler.as_ref()).await;
    }
    tracing::warn!("Consumer for {} cancelled by broker", queue);
    queue
}

async fn dispatch<H: EventHandler>(delivery: Delivery, handler: &H) {
    match WorkerEvent::decode(delivery.queue, &delivery.data) {
        Ok(event) => {
            tracing::debug!("Received on {}: {:?}", delivery.queue, event);
            handler.handle(event);
        }
        Err(e) => {
            // Undecodable messages are dropped, not redelivered.
            tracing::warn!("Discarding message on {}: {}", delivery.queue, e);
        }
    }
    if let Err(e) = delivery.ack().await {
        tracing::error!("{}", e);
    }
}
