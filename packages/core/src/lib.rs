//! Core domain types for the relay system.
//!
//! This crate contains shared types used across all packages:
//! - ProcessingInput and its validation for inbound work requests
//! - ProcessingResult and ProcessingState for outcomes and snapshots
//! - QueueName for the six well-known broker queues
//! - Wire encoding for queue payloads
//! - Events for work-item lifecycle observation

mod events;
mod input;
mod queue;
mod result;
mod state;
pub mod wire;

pub use events::WorkEvent;
pub use input::{MAX_AGE, ProcessingInput, ProcessingRequest, ValidationError};
pub use queue::QueueName;
pub use result::ProcessingResult;
pub use state::{ProcessingState, ProcessingStatus, reasons};
