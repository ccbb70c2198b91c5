//! Event types for observing work-item lifecycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProcessingStatus;

/// Events emitted by the work engine as items move through their lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkEvent {
    /// A new item was registered in `New`.
    Created { id: String, timestamp: DateTime<Utc> },
    /// The computation for an item started.
    Started { id: String, timestamp: DateTime<Utc> },
    /// An item finished with a value.
    Completed {
        id: String,
        value: i64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// An item moved to `Error`.
    Failed {
        id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A terminal item was removed by `clear`.
    Evicted {
        id: String,
        status: ProcessingStatus,
        timestamp: DateTime<Utc>,
    },
    /// An in-flight item was force-finished and removed by `terminate`.
    Terminated { id: String, timestamp: DateTime<Utc> },
}

impl WorkEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            WorkEvent::Created { timestamp, .. }
            | WorkEvent::Started { timestamp, .. }
            | WorkEvent::Completed { timestamp, .. }
            | WorkEvent::Failed { timestamp, .. }
            | WorkEvent::Evicted { timestamp, .. }
            | WorkEvent::Terminated { timestamp, .. } => *timestamp,
        }
    }

    /// Get the id of the work item this event is about.
    pub fn id(&self) -> &str {
        match self {
            WorkEvent::Created { id, .. }
            | WorkEvent::Started { id, .. }
            | WorkEvent::Completed { id, .. }
            | WorkEvent::Failed { id, .. }
            | WorkEvent::Evicted { id, .. }
            | WorkEvent::Terminated { id, .. } => id,
        }
    }

    /// The status the item holds after this event, if it is still tracked.
    pub fn status_after(&self) -> Option<ProcessingStatus> {
        match self {
            WorkEvent::Created { .. } => Some(ProcessingStatus::New),
            WorkEvent::Started { .. } => Some(ProcessingStatus::Processing),
            WorkEvent::Completed { .. } => Some(ProcessingStatus::Done),
            WorkEvent::Failed { .. } => Some(ProcessingStatus::Error),
            WorkEvent::Evicted { .. } | WorkEvent::Terminated { .. } => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            WorkEvent::Created { id, .. } => format!("Item {} created", id),
            WorkEvent::Started { id, .. } => format!("Item {} processing", id),
            WorkEvent::Completed {
                id,
                value,
                duration_ms,
                ..
            } => format!("Item {} done in {}ms: {}", id, duration_ms, value),
            WorkEvent::Failed { id, reason, .. } => format!("Item {} failed: {}", id, reason),
            WorkEvent::Evicted { id, status, .. } => format!("Item {} ({}) cleared", id, status),
            WorkEvent::Terminated { id, .. } => format!("Item {} terminated", id),
        }
    }
}
