//! Message broker access for the relay.
//!
//! The gateway and the worker only talk to each other through six named
//! queues. This crate provides the `Broker` abstraction over those queues,
//! with an in-memory implementation and a RabbitMQ one (feature `amqp`).

#[cfg(feature = "amqp")]
mod amqp;
mod broker;
mod config;
mod error;
mod memory;
pub mod retry;

#[cfg(feature = "amqp")]
pub use amqp::AmqpBroker;
pub use broker::{Acker, Broker, Delivery, Subscription};
pub use config::{BrokerConfig, BrokerKind, parse_var};
pub use error::{ConfigError, TransportError};
pub use memory::MemoryBroker;

use relay_core::QueueName;

/// Broker selected at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnyBroker {
    Memory(MemoryBroker),
    #[cfg(feature = "amqp")]
    Amqp(AmqpBroker),
}

impl AnyBroker {
    /// Build the broker described by `config`. `tag` names this process on the broker.
    pub async fn connect(config: &BrokerConfig, tag: &str) -> Result<Self, TransportError> {
        match config.kind {
            BrokerKind::Memory => Ok(AnyBroker::Memory(MemoryBroker::new())),
            #[cfg(feature = "amqp")]
            BrokerKind::Amqp => Ok(AnyBroker::Amqp(AmqpBroker::connect(config, tag).await?)),
            #[cfg(not(feature = "amqp"))]
            BrokerKind::Amqp => {
                let _ = tag;
                Err(TransportError::AmqpDisabled)
            }
        }
    }
}

impl Broker for AnyBroker {
    fn name(&self) -> &'static str {
        match self {
            AnyBroker::Memory(broker) => broker.name(),
            #[cfg(feature = "amqp")]
            AnyBroker::Amqp(broker) => broker.name(),
        }
    }

    async fn publish(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), TransportError> {
        match self {
            AnyBroker::Memory(broker) => broker.publish(queue, payload).await,
            #[cfg(feature = "amqp")]
            AnyBroker::Amqp(broker) => broker.publish(queue, payload).await,
        }
    }

    async fn subscribe(&self, queue: QueueName) -> Result<Subscription, TransportError> {
        match self {
            AnyBroker::Memory(broker) => broker.subscribe(queue).await,
            #[cfg(feature = "amqp")]
            AnyBroker::Amqp(broker) => broker.subscribe(queue).await,
        }
    }
}
