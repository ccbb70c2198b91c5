//! Queue payload encoding.
//!
//! Structured payloads (`inputs`, `outputs`, `status-response`) are JSON keyed
//! by field name. A status request is the bare identifier as UTF-8, and the
//! `clear` / `terminate` signals carry an empty body.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("status request is not valid UTF-8")]
    InvalidIdentifier(#[from] std::string::FromUtf8Error),

    #[error("status request carries an empty identifier")]
    EmptyIdentifier,
}

/// Encode a structured payload.
pub fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(payload)?)
}

/// Decode a structured payload.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode a status request body.
pub fn encode_identifier(id: &str) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Decode a status request body.
pub fn decode_identifier(bytes: &[u8]) -> Result<String, WireError> {
    let id = String::from_utf8(bytes.to_vec())?;
    if id.is_empty() {
        return Err(WireError::EmptyIdentifier);
    }
    Ok(id)
}

/// Body of the empty `clear` / `terminate` signals.
pub fn signal() -> Vec<u8> {
    Vec::new()
}
