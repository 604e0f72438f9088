//! Store adapter bridging a Prometheus-style query layer to a cloud
//! monitoring API.
//!
//! The crate translates equality-matcher series queries into upstream fetch
//! parameters, merges the returned dimensions with configured external
//! labels, compresses the samples into self-contained XOR chunks, and
//! streams the resulting series to the caller. Label-name and label-value
//! listings are answered from configuration alone.
//!
//! The main entry point is [`MetricStore`]; callers supply an upstream
//! [`MetricDataClient`] implementation and a [`SeriesSink`] for output.

pub mod chunk;
pub mod config;
pub mod labels;
pub mod matchers;
pub mod query;
pub mod store;
pub mod upstream;

pub use chunk::{Chunk, ChunkEncoding, Sample};
pub use config::{MetricConfig, StoreConfig};
pub use labels::Label;
pub use matchers::{MatchOp, Matcher};
pub use query::SeriesQuery;
pub use store::{ChannelSink, MetricStore, Series, SeriesSink, StoreError, StoreInfo};
pub use upstream::{Dimension, MetricDataClient, MetricDataResponse};
