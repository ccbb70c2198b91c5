//! The six well-known broker queues shared by gateway and worker.

use serde::{Deserialize, Serialize};

/// Named queue on the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueName {
    /// Gateway -> worker: `ProcessingInput`.
    Inputs,
    /// Worker -> gateway: `ProcessingResult`.
    Outputs,
    /// Gateway -> worker: raw identifier.
    StatusRequest,
    /// Worker -> gateway: `ProcessingState`.
    StatusResponse,
    /// Gateway -> worker: empty signal.
    Clear,
    /// Gateway -> worker: empty signal.
    Terminate,
}

impl QueueName {
    /// Every queue, in declaration order.
    pub const ALL: [QueueName; 6] = [
        QueueName::Inputs,
        QueueName::Outputs,
        QueueName::StatusRequest,
        QueueName::StatusResponse,
        QueueName::Clear,
        QueueName::Terminate,
    ];

    /// Queues the worker consumes.
    pub const WORKER_INBOUND: [QueueName; 4] = [
        QueueName::Inputs,
        QueueName::StatusRequest,
        QueueName::Clear,
        QueueName::Terminate,
    ];

    /// Queues the gateway consumes.
    pub const GATEWAY_INBOUND: [QueueName; 2] = [QueueName::Outputs, QueueName::StatusResponse];

    /// Broker-level name of the queue.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::Inputs => "inputs",
            QueueName::Outputs => "outputs",
            QueueName::StatusRequest => "status-request",
            QueueName::StatusResponse => "status-response",
            QueueName::Clear => "clear",
            QueueName::Terminate => "terminate",
        }
    }

    /// Look up a queue by its broker-level name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == name)
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
