//! HTTP routes of the gateway.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use relay_core::{ProcessingInput, ProcessingRequest, ProcessingState};
use transport::Broker;

use crate::client::GatewayClient;
use crate::error::GatewayError;

/// Build the router for a gateway client.
pub fn router<B: Broker>(client: GatewayClient<B>) -> Router {
    Router::new()
        .route("/status", get(status_without_id))
        .route("/status/:id", get(status::<B>))
        .route("/sync", post(process_sync::<B>))
        .route("/async", post(process_async::<B>))
        .route("/clear", delete(clear::<B>))
        .route("/terminate", delete(terminate::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(client)
}

fn validated(
    payload: Result<Json<ProcessingRequest>, JsonRejection>,
) -> Result<ProcessingInput, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::Rejected(e.body_text()))?;
    Ok(request.validate()?)
}

async fn status_without_id() -> GatewayError {
    GatewayError::MissingId
}

async fn status<B: Broker>(
    State(client): State<GatewayClient<B>>,
    Path(id): Path<String>,
) -> Result<Json<ProcessingState>, GatewayError> {
    if id.trim().is_empty() {
        return Err(GatewayError::MissingId);
    }
    Ok(Json(client.request_status(&id).await?))
}

async fn process_sync<B: Broker>(
    State(client): State<GatewayClient<B>>,
    payload: Result<Json<ProcessingRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let input = validated(payload)?;
    let result = client.process_sync(input).await?;
    let status = if result.is_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(result)).into_response())
}

async fn process_async<B: Broker>(
    State(client): State<GatewayClient<B>>,
    payload: Result<Json<ProcessingRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let input = validated(payload)?;
    let id = input.id.clone();
    client.process_async(input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

async fn clear<B: Broker>(
    State(client): State<GatewayClient<B>>,
) -> Result<Response, GatewayError> {
    client.clear().await?;
    Ok((StatusCode::CREATED, Json(json!({}))).into_response())
}

async fn terminate<B: Broker>(
    State(client): State<GatewayClient<B>>,
) -> Result<Response, GatewayError> {
    client.terminate().await?;
    Ok((StatusCode::CREATED, Json(json!({}))).into_response())
}
