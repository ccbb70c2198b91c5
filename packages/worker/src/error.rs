//! Error types for the worker.

use relay_core::QueueName;
use relay_core::wire::WireError;
use thiserror::Error;
use transport::{ConfigError, TransportError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Malformed payload: {0}")]
    Wire(#[from] WireError),

    #[error("Worker does not consume {0}")]
    UnexpectedQueue(QueueName),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to start or keep running the worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Failed to start engine: {0}")]
    Engine(#[from] actors::SpawnErr),

    #[error("All broker consumers were cancelled")]
    ConsumersClosed,
}
