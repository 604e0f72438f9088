//! Translation of inbound series queries into upstream request parameters.
//!
//! This is where the two data models meet: an arbitrary equality-matcher
//! selector on one side and the upstream API's fixed
//! `namespace + metric + region + dimensions + window` parameters on the
//! other. Two reserved matcher names drive the translation: `region` selects
//! the upstream region and `__name__` selects the configured metric; every
//! other equality matcher becomes an instance dimension filter.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::StoreConfig;
use crate::matchers::{equality_lookup, Matcher};
use crate::store::StoreError;
use crate::upstream::{Dimension, UpstreamQuery};

/// Reserved matcher name selecting the upstream region.
pub const REGION_LABEL: &str = "region";
/// Reserved matcher name carrying the logical metric identity.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Fixed upstream sampling period in seconds.
///
/// The translator deliberately ignores any caller-supplied resolution hint;
/// the upstream request always asks for 60-second granularity.
pub const PERIOD_SECONDS: u64 = 60;

/// An inbound series query: matchers plus an inclusive time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub matchers: Vec<Matcher>,
    /// Range start, milliseconds since the Unix epoch. Must be <= `max_time_ms`.
    pub min_time_ms: i64,
    /// Range end, milliseconds since the Unix epoch.
    pub max_time_ms: i64,
}

/// Translate a series query into upstream request parameters.
///
/// # Parameters
///
/// - `query` - The inbound selector and time range
/// - `config` - Immutable store configuration holding the metric table
///
/// # Returns
///
/// Returns the upstream request with the metric resolved, dimension filters
/// sorted by name, the window rendered as RFC3339 UTC at second resolution,
/// and the fixed 60-second period.
///
/// # Errors
///
/// - `MissingParameter` when the `region` or `__name__` matcher is absent
/// - `UnsupportedMetric` when the metric name has no configuration entry
/// - `InvalidTimeRange` when a boundary is not representable as a timestamp
pub fn translate(query: &SeriesQuery, config: &StoreConfig) -> Result<UpstreamQuery, StoreError> {
    let lookup = equality_lookup(&query.matchers);

    let region = matcher_value(&lookup, REGION_LABEL)
        .ok_or(StoreError::MissingParameter(REGION_LABEL))?;
    let name = matcher_value(&lookup, METRIC_NAME_LABEL)
        .ok_or(StoreError::MissingParameter(METRIC_NAME_LABEL))?;

    let metric = config
        .metrics
        .get(name)
        .ok_or_else(|| StoreError::UnsupportedMetric(name.to_string()))?;

    let mut filters: Vec<Dimension> = lookup
        .values()
        .filter(|m| m.name != REGION_LABEL && m.name != METRIC_NAME_LABEL)
        .map(|m| Dimension::new(m.name.clone(), m.value.clone()))
        .collect();
    // Upstream does not care about filter order; sort for determinism.
    filters.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(UpstreamQuery {
        region: region.to_string(),
        namespace: metric.namespace.clone(),
        metric_name: metric.metric_name.clone(),
        start_time: rfc3339_seconds(query.min_time_ms)?,
        end_time: rfc3339_seconds(query.max_time_ms)?,
        period_seconds: PERIOD_SECONDS,
        filters,
    })
}

fn matcher_value<'a>(
    lookup: &fnv::FnvHashMap<&str, &'a Matcher>,
    name: &str,
) -> Option<&'a str> {
    lookup.get(name).map(|m| m.value.as_str()).filter(|v| !v.is_empty())
}

/// Render a millisecond timestamp as an RFC3339 UTC string at whole seconds.
fn rfc3339_seconds(time_ms: i64) -> Result<String, StoreError> {
    OffsetDateTime::from_unix_timestamp(time_ms / 1000)
        .map_err(|_| StoreError::InvalidTimeRange(time_ms))?
        .format(&Rfc3339)
        .map_err(|_| StoreError::InvalidTimeRange(time_ms))
}
