//! Gateway side of the relay.
//!
//! Accepts work over HTTP, publishes it to the worker through the broker, and
//! pairs the worker's answers with the requests waiting for them.
//!
//! # Routes
//!
//! - `GET /status/:id` - State of an item, as reported by the worker
//! - `POST /sync` - Submit and wait for the result
//! - `POST /async` - Submit and return immediately
//! - `DELETE /clear` - Drop finished items
//! - `DELETE /terminate` - Force-finish running items

mod client;
mod config;
mod error;
mod http;
mod listener;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::{ErrorBody, GatewayError, MISSING_ID};
pub use http::router;
pub use listener::ResponseListener;
