//! Bridge from worker events to the work engine.

use actors::WorkEngine;
use relay_core::{ProcessingInput, ProcessingResult, ProcessingState, QueueName, reasons, wire};
use serde::Serialize;
use transport::Broker;

use crate::dispatch::EventHandler;

/// Runs inbound events against the engine and publishes the answers.
pub struct EngineBridge<B: Broker> {
    engine: WorkEngine,
    broker: B,
}

impl<B: Broker> EngineBridge<B> {
    pub fn new(engine: WorkEngine, broker: B) -> Self {
        Self { engine, broker }
    }
}

impl<B: Broker> EventHandler for EngineBridge<B> {
    fn on_input(&self, input: ProcessingInput) {
        // Queue the submission before returning so it stays ordered with
        // clear and terminate signals dispatched after it.
        let id = input.id.clone();
        let pending = self.engine.enqueue_submit(input);
        let broker = self.broker.clone();
        tokio::spawn(async move {
            let outcome = match pending {
                Ok(reply) => reply.recv().await,
                Err(e) => Err(e),
            };
            let result = outcome.unwrap_or_else(|e| {
                tracing::error!("Engine failed to process {}: {}", id, e);
                ProcessingResult::failure(&id, format!("{}: {}", reasons::TRANSPORT_ERROR, e))
            });
            publish(&broker, QueueName::Outputs, &result).await;
        });
    }

    fn on_status_request(&self, id: String) {
        let pending = self.engine.enqueue_get_state(&id);
        let broker = self.broker.clone();
        tokio::spawn(async move {
            let outcome = match pending {
                Ok(reply) => reply.recv().await,
                Err(e) => Err(e),
            };
            let state = outcome.unwrap_or_else(|e| {
                tracing::error!("Engine failed to report {}: {}", id, e);
                ProcessingState::failed(&id, format!("{}: {}", reasons::TRANSPORT_ERROR, e))
            });
            publish(&broker, QueueName::StatusResponse, &state).await;
        });
    }

    fn on_clear(&self) {
        if let Err(e) = self.engine.clear() {
            tracing::error!("Clear failed: {}", e);
        }
    }

    fn on_terminate(&self) {
        if let Err(e) = self.engine.terminate() {
            tracing::error!("Terminate failed: {}", e);
        }
    }
}

async fn publish<B: Broker, T: Serialize>(broker: &B, queue: QueueName, payload: &T) {
    let bytes = match wire::encode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to encode {} payload: {}", queue, e);
            return;
        }
    };
    if let Err(e) = broker.publish(queue, bytes).await {
        tracing::error!("{}", e);
    }
}
