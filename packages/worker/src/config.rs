//! Worker configuration.

use std::time::Duration;

use transport::{BrokerConfig, ConfigError, parse_var};

/// Worker settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub broker: BrokerConfig,
    /// Delay of the stand-in computation.
    pub processing_duration: Duration,
    /// Ceiling after which a computation fails with "deadline exceeded".
    pub max_processing: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            processing_duration: Duration::from_secs(10),
            max_processing: actors::DEFAULT_MAX_DURATION,
        }
    }
}

impl WorkerConfig {
    /// Build a config from environment variables.
    ///
    /// Besides the broker variables:
    /// - `PROCESSING_DURATION_MS` (default: `10000`)
    /// - `MAX_PROCESSING_MS` (default: `60000`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let broker = BrokerConfig::from_lookup(&lookup)?;
        let processing_ms = parse_var(
            &lookup,
            "PROCESSING_DURATION_MS",
            defaults.processing_duration.as_millis() as u64,
        )?;
        let max_ms = parse_var(
            &lookup,
            "MAX_PROCESSING_MS",
            defaults.max_processing.as_millis() as u64,
        )?;

        Ok(Self {
            broker,
            processing_duration: Duration::from_millis(processing_ms),
            max_processing: Duration::from_millis(max_ms),
        })
    }

    /// Set the stand-in computation delay.
    pub fn with_processing_duration(mut self, duration: Duration) -> Self {
        self.processing_duration = duration;
        self
    }
}
