//! Work-item status and state snapshots.

use serde::{Deserialize, Serialize};

use crate::ProcessingResult;

/// Reasons attached to `Error` states produced by the system itself.
pub mod reasons {
    /// A submission reused an id that is still tracked.
    pub const DUPLICATE_ID: &str = "duplicate id";
    /// A status query named an id that is not tracked.
    pub const NOT_FOUND: &str = "not found";
    /// An in-flight item was force-finished by `terminate`.
    pub const TERMINATED: &str = "terminated";
    /// The computation overran the engine deadline.
    pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";
    /// Prefix for failures synthesized on the gateway side of the queue.
    pub const TRANSPORT_ERROR: &str = "transport error";
}

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Item was accepted but the computation has not started.
    #[default]
    New,
    /// Computation is running.
    Processing,
    /// Computation finished with a value.
    Done,
    /// Item failed, was rejected, or was terminated.
    Error,
}

impl ProcessingStatus {
    /// Check if no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Done | ProcessingStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::New => "new",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Done => "done",
            ProcessingStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a work item, as published on the `status-response` queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub id: String,
    pub status: ProcessingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessingResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ProcessingState {
    /// A freshly accepted item.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ProcessingStatus::New,
            result: None,
            reason: None,
        }
    }

    /// Synthetic state for an id the engine does not track.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::failed(id, reasons::NOT_FOUND)
    }

    /// An `Error` state whose result mirrors the reason.
    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        let id = id.into();
        let reason = reason.into();
        Self {
            result: Some(ProcessingResult::failure(id.clone(), reason.clone())),
            id,
            status: ProcessingStatus::Error,
            reason: Some(reason),
        }
    }

    /// Move to a terminal status derived from `result`.
    pub fn finish(&mut self, result: ProcessingResult) {
        match &result.error {
            Some(error) => {
                self.status = ProcessingStatus::Error;
                self.reason = Some(error.clone());
            }
            None => {
                self.status = ProcessingStatus::Done;
                self.reason = None;
            }
        }
        self.result = Some(result);
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
