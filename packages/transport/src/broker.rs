//! Broker abstraction shared by the gateway and the worker.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use relay_core::QueueName;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// A message queue broker with named, durable point-to-point queues.
///
/// Publishing is fire-and-forget. Each queue has at most one consumer,
/// and every delivery must be acknowledged after it has been handled.
pub trait Broker: Clone + Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Publish `payload` to `queue`.
    fn publish(
        &self,
        queue: QueueName,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Start consuming `queue`.
    fn subscribe(
        &self,
        queue: QueueName,
    ) -> impl Future<Output = Result<Subscription, TransportError>> + Send;
}

/// Acknowledgement handle for a delivery.
#[derive(Debug)]
pub enum Acker {
    /// Counts acknowledgements on the in-memory broker.
    Memory(Arc<AtomicUsize>),
    #[cfg(feature = "amqp")]
    Amqp(lapin::acker::Acker),
}

/// A message received from a queue.
#[derive(Debug)]
pub struct Delivery {
    pub queue: QueueName,
    pub data: Vec<u8>,
    acker: Acker,
}

impl Delivery {
    pub fn new(queue: QueueName, data: Vec<u8>, acker: Acker) -> Self {
        Self { queue, data, acker }
    }

    /// Acknowledge the delivery so the broker drops it.
    pub async fn ack(self) -> Result<(), TransportError> {
        match self.acker {
            Acker::Memory(acked) => {
                acked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            #[cfg(feature = "amqp")]
            Acker::Amqp(acker) => acker
                .ack(lapin::options::BasicAckOptions::default())
                .await
                .map_err(|e| TransportError::Ack(e.to_string())),
        }
    }
}

/// Stream of deliveries from one queue.
///
/// `next` returns `None` once the broker has cancelled the consumer.
#[derive(Debug)]
pub struct Subscription {
    queue: QueueName,
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl Subscription {
    pub fn new(queue: QueueName, rx: mpsc::UnboundedReceiver<Delivery>) -> Self {
        Self { queue, rx }
    }

    pub fn queue(&self) -> QueueName {
        self.queue
    }

    /// Wait for the next delivery.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}
