//! Message types for actor communication.

use ractor::RpcReplyPort;
use relay_core::{ProcessingInput, ProcessingResult, ProcessingState};
use serde::Serialize;
use tokio::sync::oneshot;

/// Messages for the EngineActor.
#[derive(Debug)]
pub enum EngineMessage {
    /// Submit a work item. The reply is sent once the item reaches a terminal state.
    Submit {
        input: ProcessingInput,
        reply: RpcReplyPort<ProcessingResult>,
    },

    /// Report the outcome of a computation run.
    Completed {
        id: String,
        run: u64,
        outcome: Result<i64, String>,
        duration_ms: u64,
    },

    /// Get a snapshot of a work item.
    GetState {
        id: String,
        reply: RpcReplyPort<ProcessingState>,
    },

    /// Remove every terminal item.
    Clear,

    /// Force-finish and remove every in-flight item.
    Terminate,

    /// Get registry counters.
    Stats { reply: RpcReplyPort<EngineStats> },

    /// Stop the engine.
    Shutdown,
}

/// Counters describing the engine registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Items currently tracked.
    pub tracked: usize,
    pub new: usize,
    pub processing: usize,
    pub done: usize,
    pub error: usize,
    /// Callers still waiting for a result.
    pub awaiting: usize,
}

/// Messages for the CorrelationActor.
#[derive(Debug)]
pub enum CorrelationMessage<R> {
    /// Record a pending completion for `id`. Replies with the registration token.
    Register {
        id: String,
        waiter: oneshot::Sender<R>,
        reply: RpcReplyPort<Result<u64, CorrelationError>>,
    },

    /// A response arrived from the broker.
    Resolve { response: R },

    /// Drop a registration whose request was never published.
    Cancel { id: String, token: u64 },

    /// Deadline of a registration elapsed.
    Expire { id: String, token: u64 },

    /// Check whether `id` has a live waiter.
    IsPending {
        id: String,
        reply: RpcReplyPort<bool>,
    },

    /// Get the number of pending completions.
    PendingCount { reply: RpcReplyPort<usize> },
}

/// Error type for correlation operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("a request for id {0} is already pending")]
    AlreadyPending(String),

    #[error("failed to publish request for id {id}: {reason}")]
    Publish { id: String, reason: String },

    #[error("pending completion for id {0} was dropped")]
    Dropped(String),

    #[error("correlation table unavailable: {0}")]
    Unavailable(String),
}

/// Error type for engine calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,
}
