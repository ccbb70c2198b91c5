//! Actor system for the relay.
//!
//! This crate provides the Ractor-based actors on both sides of the queue:
//! the work engine that owns item state, and the correlation tables that
//! pair broker responses with waiting requests.
//!
//! # Architecture
//!
//! - `EngineActor` - Tracks work items and runs the computation for each
//! - `CorrelationActor` - Matches responses to pending requests by id
//!
//! # Usage
//!
//! ```ignore
//! use actors::{DelayedDraw, EngineArgs, start_engine};
//!
//! let (engine, handle) = start_engine(EngineArgs::new(Arc::new(DelayedDraw::new(delay)))).await?;
//! let result = engine.submit(input).await?;
//! ```

mod computation;
mod correlation_actor;
mod engine_actor;
mod messages;

pub use computation::{Computation, ComputationFuture, ComputationResult, DelayedDraw};
pub use correlation_actor::{
    Correlated, CorrelationActor, CorrelationTable, DEFAULT_RESPONSE_TIMEOUT, start_correlation,
};
pub use engine_actor::{
    DEFAULT_MAX_DURATION, EngineActor, EngineArgs, EngineReply, WorkEngine, start_engine,
};
pub use messages::{CorrelationError, CorrelationMessage, EngineError, EngineMessage, EngineStats};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, SpawnErr};
