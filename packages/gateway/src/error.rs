//! Gateway error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use actors::CorrelationError;
use relay_core::ValidationError;
use relay_core::wire::WireError;
use transport::{ConfigError, TransportError};

/// Message returned when a status query carries no id.
pub const MISSING_ID: &str = "Provide an ID of the process, please";

/// Body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body could not be read as a JSON object.
    #[error("{0}")]
    Rejected(String),

    #[error("{}", MISSING_ID)]
    MissingId,

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to start actor: {0}")]
    Spawn(#[from] actors::SpawnErr),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::Rejected(_) | GatewayError::MissingId => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Correlation(CorrelationError::AlreadyPending(_)) => StatusCode::CONFLICT,
            GatewayError::Correlation(_) | GatewayError::Transport(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Wire(_) | GatewayError::Config(_) | GatewayError::Spawn(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
