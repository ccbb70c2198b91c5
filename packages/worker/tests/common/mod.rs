#![allow(dead_code)]

use std::error::Error;
use std::time::Duration;

use relay_core::{ProcessingInput, QueueName, wire};
use serde::de::DeserializeOwned;
use transport::{Broker, MemoryBroker, Subscription};
use worker::{Worker, WorkerConfig};

pub const PROCESSING: Duration = Duration::from_millis(150);

/// Start a worker on a fresh in-memory broker.
pub async fn start_worker() -> Result<(MemoryBroker, Worker), Box<dyn Error>> {
    let broker = MemoryBroker::new();
    let config = WorkerConfig::default().with_processing_duration(PROCESSING);
    let worker = Worker::start(broker.clone(), &config).await?;
    Ok((broker, worker))
}

pub async fn send_input(broker: &MemoryBroker, id: &str) -> Result<(), Box<dyn Error>> {
    let input = ProcessingInput::new(id, "Grace", "Hopper", 85);
    broker.publish(QueueName::Inputs, wire::encode(&input)?).await?;
    Ok(())
}

/// Receive and decode the next message, failing after two seconds.
pub async fn receive<T: DeserializeOwned>(sub: &mut Subscription) -> Result<T, Box<dyn Error>> {
    let delivery = tokio::time::timeout(Duration::from_secs(2), sub.next())
        .await?
        .ok_or("subscription ended")?;
    let payload = wire::decode(&delivery.data)?;
    delivery.ack().await?;
    Ok(payload)
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
