//! Upstream monitoring API boundary.
//!
//! The store core never talks to the cloud API directly; it goes through the
//! [`MetricDataClient`] capability, which a transport-owning caller implements
//! against the real SDK. The wire model here mirrors the upstream response
//! shape, including the outer envelope: a missing envelope is a protocol
//! violation and is distinct from a valid zero-result response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Boxed error type carried across the collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One key/value attribute of a monitored resource, analogous to a label.
///
/// Also used as a dimension filter in upstream requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    /// Create a new dimension pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Parameters of one upstream metric data fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamQuery {
    /// Upstream region the monitored resources live in.
    pub region: String,
    /// Upstream namespace, e.g. `QCE/CVM`.
    pub namespace: String,
    /// Metric identifier understood by the upstream API.
    pub metric_name: String,
    /// Window start, RFC3339 UTC, second resolution.
    pub start_time: String,
    /// Window end, RFC3339 UTC, second resolution.
    pub end_time: String,
    /// Sampling period in seconds; always the fixed translator constant.
    pub period_seconds: u64,
    /// Instance dimension filters, sorted by name. Empty means wildcard.
    pub filters: Vec<Dimension>,
}

/// One raw series returned by the upstream API.
///
/// `timestamps` and `values` are parallel arrays keyed by the same index:
/// `values[i]` belongs to `timestamps[i]`. Timestamps are in seconds and
/// ascending.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawSeries {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub timestamps: Vec<i64>,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Payload of a successful upstream fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MetricData {
    #[serde(default)]
    pub data_points: Vec<RawSeries>,
}

/// Outer response envelope of the upstream API.
///
/// `response: None` models a structurally absent body; callers must treat it
/// as an upstream failure, not as an empty result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MetricDataResponse {
    #[serde(default)]
    pub response: Option<MetricData>,
}

/// Capability to fetch raw metric data from the upstream monitoring API.
///
/// Implementations own credentials, transport, and any retry policy; this
/// core performs exactly one fetch per series query and never retries.
#[async_trait]
pub trait MetricDataClient: Send + Sync {
    /// Fetch raw series for the given request parameters.
    ///
    /// # Parameters
    ///
    /// - `query` - Translated upstream request parameters
    ///
    /// # Returns
    ///
    /// Returns the upstream response envelope, or any transport/API error.
    async fn fetch_metric_data(&self, query: &UpstreamQuery) -> Result<MetricDataResponse, BoxError>;
}
