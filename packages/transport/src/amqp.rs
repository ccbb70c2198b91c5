//! RabbitMQ broker using the `lapin` crate.
//!
//! Queues are declared durable on the default exchange; messages are
//! published with the queue name as routing key and consumed with manual ack.

use std::sync::Arc;

use futures_util::StreamExt;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use relay_core::QueueName;
use tokio::sync::mpsc;

use crate::broker::{Acker, Broker, Delivery, Subscription};
use crate::config::BrokerConfig;
use crate::error::TransportError;
use crate::retry::{RetryPolicy, retry_with_backoff};

/// RabbitMQ-backed broker. Clones share one connection and channel.
#[derive(Clone)]
pub struct AmqpBroker {
    connection: Arc<Connection>,
    channel: Channel,
    /// Prefix for consumer tags, identifying this process in the management UI.
    tag: String,
}

impl std::fmt::Debug for AmqpBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmqpBroker")
            .field("tag", &self.tag)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl AmqpBroker {
    /// Connect with exponential backoff and declare every queue.
    pub async fn connect(config: &BrokerConfig, tag: &str) -> Result<Self, TransportError> {
        let uri = config.uri();
        let policy = RetryPolicy::default().with_max_attempts(config.connect_retries);

        tracing::info!("Connecting to RabbitMQ: {}", uri);
        let connection = retry_with_backoff(&policy, || {
            Connection::connect(
                &uri,
                ConnectionProperties::default().with_connection_name(tag.into()),
            )
        })
        .await
        .map_err(|e| TransportError::Connection(format!("RabbitMQ connection failed: {}", e)))?;

        let channel = connection.create_channel().await.map_err(|e| {
            TransportError::Connection(format!("RabbitMQ channel creation failed: {}", e))
        })?;

        // One unacknowledged delivery per consumer at a time.
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| TransportError::Connection(format!("Failed to set QoS: {}", e)))?;

        let broker = Self {
            connection: Arc::new(connection),
            channel,
            tag: tag.to_string(),
        };
        broker.declare_all().await?;
        Ok(broker)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    async fn declare_all(&self) -> Result<(), TransportError> {
        for queue in QueueName::ALL {
            self.channel
                .queue_declare(
                    queue.as_str(),
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await
                .map_err(|e| TransportError::Declare {
                    queue,
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

impl Broker for AmqpBroker {
    fn name(&self) -> &'static str {
        "amqp"
    }

    async fn publish(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), TransportError> {
        let publish_err = |e: lapin::Error| TransportError::Publish {
            queue,
            reason: e.to_string(),
        };

        self.channel
            .basic_publish(
                "",
                queue.as_str(),
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(publish_err)?
            .await
            .map_err(publish_err)?;

        tracing::debug!("Published {} bytes to {}", payload.len(), queue);
        Ok(())
    }

    async fn subscribe(&self, queue: QueueName) -> Result<Subscription, TransportError> {
        let mut consumer = self
            .channel
            .basic_consume(
                queue.as_str(),
                &format!("{}-{}", self.tag, queue),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TransportError::Consume {
                queue,
                reason: e.to_string(),
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(item) = consumer.next().await {
                match item {
                    Ok(delivery) => {
                        let delivery =
                            Delivery::new(queue, delivery.data, Acker::Amqp(delivery.acker));
                        if tx.send(delivery).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Consumer for {} failed: {}", queue, e);
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(queue, rx))
    }
}
