//! Worker side of the relay.
//!
//! The worker consumes `inputs`, `status-request`, `clear` and `terminate`,
//! drives the work engine, and publishes results to `outputs` and state
//! snapshots to `status-response`.

mod config;
mod dispatch;
mod error;
mod fatal;
mod service;

pub use config::WorkerConfig;
pub use dispatch::{EventDispatcher, EventHandler, WorkerEvent};
pub use error::{DispatchError, WorkerError};
pub use fatal::{PANIC_EXIT_CODE, PanicHook, install_panic_hook, panic_hook};
pub use service::EngineBridge;

use std::sync::Arc;

use actors::{DelayedDraw, EngineArgs, WorkEngine, start_engine};
use transport::{AnyBroker, Broker};

/// A running worker: the engine plus the consumers feeding it.
pub struct Worker {
    engine: WorkEngine,
    dispatcher: EventDispatcher,
}

impl Worker {
    /// Start the engine and attach it to `broker`.
    pub async fn start<B: Broker>(broker: B, config: &WorkerConfig) -> Result<Self, WorkerError> {
        let computation = Arc::new(DelayedDraw::new(config.processing_duration));
        let args = EngineArgs::new(computation).with_max_duration(config.max_processing);
        let (engine, _handle) = start_engine(args).await?;

        let bridge = Arc::new(EngineBridge::new(engine.clone(), broker.clone()));
        let dispatcher = match EventDispatcher::start(&broker, bridge).await {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                engine.shutdown();
                return Err(e.into());
            }
        };

        Ok(Self { engine, dispatcher })
    }

    pub fn engine(&self) -> &WorkEngine {
        &self.engine
    }

    /// Run until every consumer has been cancelled by the broker.
    pub async fn run(self) -> Result<(), WorkerError> {
        self.dispatcher.closed().await;
        self.engine.shutdown();
        Err(WorkerError::ConsumersClosed)
    }

    /// Stop consuming and shut the engine down.
    pub fn shutdown(mut self) {
        self.dispatcher.abort();
        self.engine.shutdown();
    }
}

/// Connect to the configured broker and run a worker until it fails.
pub async fn run(config: WorkerConfig) -> Result<(), WorkerError> {
    let broker = AnyBroker::connect(&config.broker, "relay-worker").await?;
    let worker = Worker::start(broker, &config).await?;
    tracing::info!("Worker ready");
    worker.run().await
}
