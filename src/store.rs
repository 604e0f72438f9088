//! Series adapter orchestrating query translation, upstream fetch, label
//! merging, chunk encoding, and streamed emission.
//!
//! `MetricStore` exposes the three operations the transport layer needs:
//! a streaming series query, label-name listing, and label-value listing.
//! Each request is handled in a single sequential pass - one translation,
//! one upstream fetch, one in-order emission loop - with no retries and no
//! internal concurrency. All state is created fresh per request except the
//! read-only configuration snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chunk::{self, Chunk, Sample};
use crate::config::StoreConfig;
use crate::labels::{build_label_set, Label};
use crate::query::{translate, SeriesQuery, METRIC_NAME_LABEL, REGION_LABEL};
use crate::upstream::{BoxError, MetricDataClient, RawSeries};

/// Regions the upstream monitoring API is served from.
pub const SUPPORTED_REGIONS: [&str; 3] = ["ap-shanghai", "ap-chengdu", "ap-beijing"];

/// Request-terminal errors surfaced by the store operations.
///
/// None of these are retried by the core; retry/backoff for transient
/// upstream conditions belongs to the [`MetricDataClient`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required reserved matcher is absent from the query.
    #[error("required matcher {0:?} is missing from the query")]
    MissingParameter(&'static str),
    /// The metric-identity value has no configuration entry.
    #[error("metric {0:?} is not supported")]
    UnsupportedMetric(String),
    /// A query boundary cannot be rendered as an upstream timestamp.
    #[error("timestamp {0} ms is outside the representable time range")]
    InvalidTimeRange(i64),
    /// The upstream fetch failed; wraps the underlying cause.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[source] BoxError),
    /// The upstream call succeeded but returned no response envelope.
    /// This is an upstream protocol violation, not a zero-result success.
    #[error("upstream returned an empty response envelope")]
    EmptyResponse,
    /// The output sink rejected a series, e.g. the caller disconnected.
    #[error("failed to emit series: {0}")]
    Emission(#[source] BoxError),
}

/// One label set plus its chunks, the unit of streamed output.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: Vec<Label>,
    pub chunks: Vec<Chunk>,
}

/// Store identity advertised to the query layer: the external labels and the
/// covered time range.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfo {
    pub labels: Vec<Label>,
    pub min_time_ms: i64,
    pub max_time_ms: i64,
}

/// Abstract output sink receiving one series at a time.
///
/// The transport layer implements this over its stream; a send error aborts
/// the remaining emission and surfaces as [`StoreError::Emission`].
#[async_trait]
pub trait SeriesSink: Send {
    /// Emit one assembled series to the caller.
    async fn send(&mut self, series: Series) -> Result<(), BoxError>;
}

/// [`SeriesSink`] over a bounded tokio channel.
///
/// Convenient for transports that forward series from a channel receiver;
/// a closed receiver surfaces as an emission failure.
pub struct ChannelSink {
    tx: mpsc::Sender<Series>,
}

impl ChannelSink {
    /// Create a sink that forwards every series into `tx`.
    pub fn new(tx: mpsc::Sender<Series>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SeriesSink for ChannelSink {
    async fn send(&mut self, series: Series) -> Result<(), BoxError> {
        self.tx.send(series).await.map_err(|e| Box::new(e) as BoxError)
    }
}

/// Store adapter answering series queries from the upstream monitoring API.
///
/// Holds only the immutable configuration snapshot and the upstream client;
/// safe to share across concurrent requests.
#[derive(Clone)]
pub struct MetricStore {
    config: Arc<StoreConfig>,
    client: Arc<dyn MetricDataClient>,
}

impl MetricStore {
    /// Create a new store over the given configuration and upstream client.
    ///
    /// # Parameters
    ///
    /// - `config` - Validated configuration snapshot, shared read-only
    /// - `client` - Upstream metric data capability
    pub fn new(config: Arc<StoreConfig>, client: Arc<dyn MetricDataClient>) -> Self {
        Self { config, client }
    }

    /// Describe this store to the query layer.
    ///
    /// Advertises the configured external labels and an unbounded time range,
    /// since the upstream API imposes no fixed retention boundary here.
    pub fn info(&self) -> StoreInfo {
        let mut labels: Vec<Label> = self
            .config
            .external_labels
            .iter()
            .map(|(name, value)| Label::new(name.clone(), value.clone()))
            .collect();
        labels.sort();
        StoreInfo { labels, min_time_ms: 0, max_time_ms: i64::MAX }
    }

    /// Answer a series query, streaming each series into `sink`.
    ///
    /// Single pass: translate the query, fetch raw data once, then emit one
    /// series per upstream result in order. Translation and fetch failures
    /// terminate before anything is emitted; a sink failure aborts the
    /// remaining iteration. Observing `cancel` mid-loop stops emission
    /// promptly and returns `Ok` - the caller is already gone.
    ///
    /// # Parameters
    ///
    /// - `query` - Matchers plus inclusive time range
    /// - `sink` - Receives each assembled series
    /// - `cancel` - External cancellation signal from the transport
    ///
    /// # Errors
    ///
    /// See [`StoreError`]; all variants are request-terminal and none are
    /// retried.
    pub async fn series(
        &self,
        query: &SeriesQuery,
        sink: &mut dyn SeriesSink,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        debug!(
            matchers = query.matchers.len(),
            min_time_ms = query.min_time_ms,
            max_time_ms = query.max_time_ms,
            "series request"
        );

        let request = translate(query, &self.config)?;
        info!(
            region = %request.region,
            request = %serde_json::to_string(&request).unwrap_or_default(),
            "querying upstream"
        );

        let response =
            self.client.fetch_metric_data(&request).await.map_err(StoreError::Upstream)?;
        let data = response.response.ok_or(StoreError::EmptyResponse)?;
        debug!(series = data.data_points.len(), "upstream returned data");

        for raw in &data.data_points {
            if cancel.is_cancelled() {
                debug!("request cancelled, aborting emission");
                return Ok(());
            }

            let labels = build_label_set(&raw.dimensions, &self.config.external_labels);
            // An empty raw series still has a meaningful label identity;
            // it is emitted with no chunks rather than an empty chunk.
            let chunks: Vec<Chunk> = chunk_raw_series(raw).into_iter().collect();
            debug!(labels = labels.len(), chunks = chunks.len(), "emitting series");

            sink.send(Series { labels, chunks }).await.map_err(StoreError::Emission)?;
        }

        Ok(())
    }

    /// List all label names this store can serve.
    ///
    /// External label names plus the two reserved names; no upstream call.
    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.config.external_labels.keys().cloned().collect();
        names.sort();
        names.push(REGION_LABEL.to_string());
        names.push(METRIC_NAME_LABEL.to_string());
        names
    }

    /// List the known values for one label name.
    ///
    /// External labels are single-valued by construction and take priority;
    /// `region` enumerates the supported regions; `__name__` enumerates the
    /// configured logical metric names. Unknown names yield an empty list,
    /// never an error. No upstream call.
    pub fn label_values(&self, name: &str) -> Vec<String> {
        if let Some(value) = self.config.external_labels.get(name) {
            return vec![value.clone()];
        }
        if name == REGION_LABEL {
            return SUPPORTED_REGIONS.iter().map(|r| (*r).to_string()).collect();
        }
        if name == METRIC_NAME_LABEL {
            let mut names: Vec<String> = self.config.metrics.keys().cloned().collect();
            names.sort();
            return names;
        }
        Vec::new()
    }
}

/// Encode one raw upstream series into its chunk, converting second
/// timestamps to milliseconds. Returns `None` for a series with no samples.
fn chunk_raw_series(raw: &RawSeries) -> Option<Chunk> {
    let samples: Vec<Sample> = raw
        .timestamps
        .iter()
        .zip(&raw.values)
        .map(|(&ts_sec, &value)| Sample::new(ts_sec * 1000, value))
        .collect();
    chunk::encode(&samples)
}
