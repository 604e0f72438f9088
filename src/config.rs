//! Store configuration model and YAML loading.
//!
//! Configuration is loaded once at startup, validated, and then shared
//! read-only across requests. It carries the upstream API credential, the
//! table of logical metric names the store understands, and the static
//! external labels attached to every emitted series.

use std::collections::HashMap;
use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable consulted when the config file omits the secret id.
pub const ENV_SECRET_ID: &str = "CLOUDMON_SECRET_ID";
/// Environment variable consulted when the config file omits the secret key.
pub const ENV_SECRET_KEY: &str = "CLOUDMON_SECRET_KEY";

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading the config file.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error.
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Neither the file nor the environment provided a credential pair.
    #[error("missing credential information")]
    MissingCredential,
    /// A configured metric has an empty upstream metric name.
    #[error("metric {0:?}: metric_name must not be empty")]
    EmptyMetricName(String),
    /// A configured namespace is not a two-segment `product/Service` string.
    #[error("metric {0:?}: namespace {1:?} should be in 'product/Service' format")]
    MalformedNamespace(String, String),
}

/// Upstream API credential pair.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Credential {
    #[serde(default)]
    pub secret_id: String,
    #[serde(default)]
    pub secret_key: String,
}

/// Upstream identity of one logical metric name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricConfig {
    /// Metric identifier understood by the upstream API, e.g. `CPUUsage`.
    pub metric_name: String,
    /// Upstream namespace, e.g. `QCE/CVM`.
    pub namespace: String,
}

/// Process-wide store configuration, immutable after load.
///
/// Shared by all requests behind an `Arc`; it is never mutated in place, so
/// unsynchronized concurrent reads are safe. A future reload would swap a
/// whole new snapshot rather than touch fields.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Credential for the upstream monitoring API.
    #[serde(default)]
    pub credential: Credential,
    /// Map from logical metric name to its upstream identity.
    #[serde(default)]
    pub metrics: HashMap<String, MetricConfig>,
    /// Static labels attached to every series, overriding upstream dimensions.
    #[serde(default)]
    pub external_labels: HashMap<String, String>,
}

impl StoreConfig {
    /// Load configuration from a YAML file and validate it.
    ///
    /// When the file carries no secret key, the credential pair is read from
    /// the `CLOUDMON_SECRET_ID` / `CLOUDMON_SECRET_KEY` environment variables
    /// instead.
    ///
    /// # Parameters
    ///
    /// - `path` - Path to the YAML configuration file
    ///
    /// # Returns
    ///
    /// Returns `Ok(StoreConfig)` on success, or `ConfigError` if the file
    /// cannot be read, parsed, or fails validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&txt)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.credential.secret_key.is_empty() {
            self.credential.secret_id = env::var(ENV_SECRET_ID).unwrap_or_default();
            self.credential.secret_key = env::var(ENV_SECRET_KEY).unwrap_or_default();
        }
        if self.credential.secret_id.is_empty() || self.credential.secret_key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }

        for (name, metric) in &self.metrics {
            if metric.metric_name.is_empty() {
                return Err(ConfigError::EmptyMetricName(name.clone()));
            }
            if metric.namespace.split('/').count() != 2 {
                return Err(ConfigError::MalformedNamespace(
                    name.clone(),
                    metric.namespace.clone(),
                ));
            }
        }
        Ok(())
    }
}
