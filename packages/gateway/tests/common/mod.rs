#![allow(dead_code)]

use std::error::Error;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use gateway::{GatewayClient, ResponseListener, router};
use serde_json::Value;
use tower::ServiceExt;
use transport::MemoryBroker;
use worker::{Worker, WorkerConfig};

pub const PROCESSING: Duration = Duration::from_millis(200);

pub struct TestApp {
    pub app: Router,
    pub broker: MemoryBroker,
    pub worker: Option<Worker>,
    /// Dropping the listener stops response delivery.
    pub listener: ResponseListener,
}

/// Gateway and worker sharing one in-memory broker.
pub async fn app_with_worker() -> Result<TestApp, Box<dyn Error>> {
    let broker = MemoryBroker::new();
    let config = WorkerConfig::default().with_processing_duration(PROCESSING);
    let worker = Worker::start(broker.clone(), &config).await?;
    let (client, listener) = GatewayClient::start(broker.clone(), Duration::from_secs(5)).await?;
    Ok(TestApp {
        app: router(client),
        broker,
        worker: Some(worker),
        listener,
    })
}

/// Gateway with nobody consuming its requests.
pub async fn app_without_worker(response_timeout: Duration) -> Result<TestApp, Box<dyn Error>> {
    let broker = MemoryBroker::new();
    let (client, listener) = GatewayClient::start(broker.clone(), response_timeout).await?;
    Ok(TestApp {
        app: router(client),
        broker,
        worker: None,
        listener,
    })
}

/// Send a request through the router and decode the JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), Box<dyn Error>> {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())?,
    };
    send_request(app, request).await
}

pub async fn send_request(
    app: &Router,
    request: Request<Body>,
) -> Result<(StatusCode, Value), Box<dyn Error>> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
