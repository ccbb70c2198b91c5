use std::process::ExitCode;

use worker::WorkerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        result = worker::run(config) => {
            if let Err(e) = result {
                tracing::error!("Worker stopped: {}", e);
            }
            ExitCode::FAILURE
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            ExitCode::SUCCESS
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    worker::install_panic_hook();
}
