//! Error types for broker access and configuration.

use relay_core::QueueName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to declare queue {queue}: {reason}")]
    Declare { queue: QueueName, reason: String },

    #[error("Failed to publish to {queue}: {reason}")]
    Publish { queue: QueueName, reason: String },

    #[error("Failed to consume {queue}: {reason}")]
    Consume { queue: QueueName, reason: String },

    #[error("Failed to acknowledge delivery: {0}")]
    Ack(String),

    #[error("Queue {0} already has a consumer")]
    AlreadyConsumed(QueueName),

    #[error("AMQP support is not compiled in")]
    AmqpDisabled,
}

/// Invalid environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
