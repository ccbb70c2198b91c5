use std::net::SocketAddr;
use std::process::ExitCode;

use gateway::{GatewayClient, GatewayConfig, router};
use transport::{AnyBroker, BrokerKind};
use worker::{Worker, WorkerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Gateway stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_env()?;
    let broker = AnyBroker::connect(&config.broker, "relay-gateway").await?;

    // With the in-memory broker the worker has to live in this process.
    let embedded = if config.broker.kind == BrokerKind::Memory {
        let worker_config = WorkerConfig::from_env()?;
        tracing::info!("Starting embedded worker");
        Some(Worker::start(broker.clone(), &worker_config).await?)
    } else {
        None
    };

    let (client, listener) = GatewayClient::start(broker, config.response_timeout).await?;
    let app = router(client.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let tcp = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Application interface is started at {} port", config.http_port);

    let outcome = tokio::select! {
        served = axum::serve(tcp, app).with_graceful_shutdown(shutdown_signal()) => {
            served.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        }
        _ = listener.closed() => Err("response consumers were cancelled by the broker".into()),
    };

    client.shutdown();
    if let Some(worker) = embedded {
        worker.shutdown();
    }
    outcome
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    worker::install_panic_hook();
}
