//! In-process broker for tests and single-process deployments.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use relay_core::QueueName;
use tokio::sync::mpsc;

use crate::broker::{Acker, Broker, Delivery, Subscription};
use crate::error::TransportError;

#[derive(Debug, Default)]
struct QueueSlot {
    /// Messages published while no consumer was attached.
    backlog: VecDeque<Vec<u8>>,
    consumer: Option<mpsc::UnboundedSender<Delivery>>,
    published: usize,
}

/// In-memory broker. Clones share the same queues.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    queues: Arc<Mutex<HashMap<QueueName, QueueSlot>>>,
    acked: Arc<AtomicUsize>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<QueueName, QueueSlot>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the consumer of `queue`, as a broker does when a queue is deleted.
    ///
    /// The subscription drains what it already received, then ends.
    pub fn cancel(&self, queue: QueueName) {
        if let Some(slot) = self.queues().get_mut(&queue) {
            if slot.consumer.take().is_some() {
                tracing::debug!("Cancelled consumer of {}", queue);
            }
        }
    }

    /// Total messages published to `queue`.
    pub fn published(&self, queue: QueueName) -> usize {
        self.queues().get(&queue).map_or(0, |slot| slot.published)
    }

    /// Messages waiting in `queue` for a consumer.
    pub fn backlog(&self, queue: QueueName) -> usize {
        self.queues().get(&queue).map_or(0, |slot| slot.backlog.len())
    }

    /// Total deliveries acknowledged across all queues.
    pub fn acked(&self) -> usize {
        self.acked.load(Ordering::SeqCst)
    }

    fn delivery(&self, queue: QueueName, data: Vec<u8>) -> Delivery {
        Delivery::new(queue, data, Acker::Memory(self.acked.clone()))
    }
}

impl Broker for MemoryBroker {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), TransportError> {
        let mut queues = self.queues();
        let slot = queues.entry(queue).or_default();
        slot.published += 1;

        if let Some(consumer) = &slot.consumer {
            match consumer.send(self.delivery(queue, payload)) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(undelivered)) => {
                    // Consumer went away; keep the message for the next one.
                    slot.consumer = None;
                    slot.backlog.push_back(undelivered.data);
                    return Ok(());
                }
            }
        }

        slot.backlog.push_back(payload);
        Ok(())
    }

    async fn subscribe(&self, queue: QueueName) -> Result<Subscription, TransportError> {
        let mut queues = self.queues();
        let slot = queues.entry(queue).or_default();

        if slot.consumer.as_ref().is_some_and(|c| !c.is_closed()) {
            return Err(TransportError::AlreadyConsumed(queue));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        while let Some(data) = slot.backlog.pop_front() {
            let _ = tx.send(self.delivery(queue, data));
        }
        slot.consumer = Some(tx);

        Ok(Subscription::new(queue, rx))
    }
}
