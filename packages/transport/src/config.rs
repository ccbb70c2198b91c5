//! Broker configuration read from the environment.

use std::str::FromStr;

use crate::error::ConfigError;

/// Which broker implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerKind {
    /// RabbitMQ over AMQP 0.9.1.
    Amqp,
    /// In-process queues; gateway and worker share one process.
    Memory,
}

/// Broker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub kind: BrokerKind,
    /// RabbitMQ host, used to build `amqp://{host}`.
    pub host: String,
    /// Connection attempts before giving up.
    pub connect_retries: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::Amqp,
            host: "localhost".to_string(),
            connect_retries: 5,
        }
    }
}

impl BrokerConfig {
    /// Config for the in-memory broker.
    pub fn memory() -> Self {
        Self {
            kind: BrokerKind::Memory,
            ..Default::default()
        }
    }

    /// Config for RabbitMQ on `host`.
    pub fn amqp(host: impl Into<String>) -> Self {
        Self {
            kind: BrokerKind::Amqp,
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn uri(&self) -> String {
        format!("amqp://{}", self.host)
    }

    /// Build a config from environment variables.
    ///
    /// - `BROKER`: `amqp` (default) or `memory`
    /// - `RABBITMQ_HOST` (default: `localhost`)
    /// - `BROKER_CONNECT_RETRIES` (default: `5`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let kind = match lookup("BROKER").and_then(non_empty).as_deref() {
            None | Some("amqp") | Some("rabbitmq") => BrokerKind::Amqp,
            Some("memory") | Some("mem") => BrokerKind::Memory,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "BROKER",
                    other,
                    "expected amqp|memory",
                ));
            }
        };

        let host = lookup("RABBITMQ_HOST")
            .and_then(non_empty)
            .unwrap_or(defaults.host);
        let connect_retries = parse_var(&lookup, "BROKER_CONNECT_RETRIES", defaults.connect_retries)?;

        Ok(Self {
            kind,
            host,
            connect_retries,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset or blank.
pub fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).and_then(non_empty) {
        Some(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var, &value, e)),
        None => Ok(default),
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
