use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

mod serde_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Environment error: {0}")]
    EnvError(String),
}

/// How actions become batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Buffer actions and send them from a background worker, triggered by
    /// batch size or flush interval.
    #[default]
    Batched,
    /// Send each action inline as a one-element batch on the caller's task.
    Immediate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// Base URL of the ingestion endpoint; `/v1/batch` is appended unless
    /// already present.
    pub endpoint: String,
    pub delivery: DeliveryMode,
    /// Backpressure bound: actions beyond this many queued are dropped.
    pub max_queue_size: usize,
    /// Send trigger: a buffered batch never exceeds this many actions.
    pub max_batch_size: usize,
    /// Send trigger: a partial buffer is flushed this long after it became
    /// non-empty.
    #[serde(with = "serde_millis")]
    pub flush_interval: Duration,
    /// Hard per-send deadline.
    #[serde(with = "serde_millis")]
    pub send_timeout: Duration,
    /// How long shutdown waits for the worker to exit.
    #[serde(with = "serde_millis")]
    pub shutdown_grace: Duration,
    pub gzip: bool,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "https://api.segment.io".to_string(),
            delivery: DeliveryMode::default(),
            max_queue_size: 10_000,
            max_batch_size: 100,
            flush_interval: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(4),
            gzip: true,
            user_agent: concat!("telemetry-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Default configuration with `TELEMETRY_RELAY_*` environment overrides
    /// applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        load_env_string("TELEMETRY_RELAY_ENDPOINT", &mut config.endpoint);
        load_env_var("TELEMETRY_RELAY_MAX_QUEUE_SIZE", &mut config.max_queue_size)?;
        load_env_var("TELEMETRY_RELAY_MAX_BATCH_SIZE", &mut config.max_batch_size)?;
        load_env_millis("TELEMETRY_RELAY_FLUSH_INTERVAL_MS", &mut config.flush_interval)?;
        load_env_millis("TELEMETRY_RELAY_SEND_TIMEOUT_MS", &mut config.send_timeout)?;
        load_env_millis("TELEMETRY_RELAY_SHUTDOWN_GRACE_MS", &mut config.shutdown_grace)?;
        load_env_var("TELEMETRY_RELAY_GZIP", &mut config.gzip)?;

        if let Ok(value) = std::env::var("TELEMETRY_RELAY_DELIVERY") {
            config.delivery = match value.as_str() {
                "batched" => DeliveryMode::Batched,
                "immediate" => DeliveryMode::Immediate,
                other => {
                    return Err(ConfigError::EnvError(format!(
                        "Invalid TELEMETRY_RELAY_DELIVERY: {other}"
                    )));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if self.max_queue_size < self.max_batch_size {
            return Err(ConfigError::InvalidConfig(format!(
                "Queue capacity ({}) must be at least as large as batch size ({})",
                self.max_queue_size, self.max_batch_size
            )));
        }

        if self.send_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "Send timeout must be greater than 0".to_string(),
            ));
        }

        if self.flush_interval.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "Flush interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load and parse an environment variable, keeping the default when unset.
fn load_env_var<T>(name: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {name}: {e}")))?;
    }
    Ok(())
}

fn load_env_millis(name: &str, target: &mut Duration) -> Result<(), ConfigError> {
    let mut millis = target.as_millis() as u64;
    load_env_var(name, &mut millis)?;
    *target = Duration::from_millis(millis);
    Ok(())
}

fn load_env_string(name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(name) {
        *target = value;
    }
}
