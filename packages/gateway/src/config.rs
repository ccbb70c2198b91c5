//! Gateway configuration.

use std::time::Duration;

use transport::{BrokerConfig, ConfigError, parse_var};

/// Gateway settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub broker: BrokerConfig,
    pub http_port: u16,
    /// How long a request waits for its answer from the worker.
    pub response_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            http_port: 8890,
            response_timeout: actors::DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Build a config from environment variables.
    ///
    /// Besides the broker variables:
    /// - `HTTP_PORT` (default: `8890`)
    /// - `RESPONSE_TIMEOUT_SECS` (default: `30`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let broker = BrokerConfig::from_lookup(&lookup)?;
        let http_port = parse_var(&lookup, "HTTP_PORT", defaults.http_port)?;
        let timeout_secs = parse_var(
            &lookup,
            "RESPONSE_TIMEOUT_SECS",
            defaults.response_timeout.as_secs(),
        )?;

        Ok(Self {
            broker,
            http_port,
            response_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
