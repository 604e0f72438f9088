//! Label model and the label set builder.
//!
//! A series' identity is its label set: upstream-reported dimensions merged
//! with the statically configured external labels. External labels always win
//! over a dimension of the same name, and the merged set is sorted
//! lexicographically by name - the caller relies on that ordering for
//! merge/dedup correctness.

use std::collections::HashMap;

use crate::upstream::Dimension;

/// A metric label representing a name=value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    /// Create a new label with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Merge upstream dimensions with external labels into one sorted label set.
///
/// A dimension whose name appears in `external` is suppressed unconditionally,
/// even when the values differ; every external entry is then appended. The
/// result is sorted ascending by name with unique names, independent of the
/// input ordering.
///
/// # Parameters
///
/// - `dimensions` - Dimension key/value pairs reported by the upstream API
/// - `external` - Static external labels from configuration
///
/// # Returns
///
/// Returns the combined, sorted label set.
pub fn build_label_set(dimensions: &[Dimension], external: &HashMap<String, String>) -> Vec<Label> {
    let mut lset = Vec::with_capacity(dimensions.len() + external.len());

    for dim in dimensions {
        if external.contains_key(&dim.name) {
            continue;
        }
        lset.push(Label::new(dim.name.clone(), dim.value.clone()));
    }

    for (name, value) in external {
        lset.push(Label::new(name.clone(), value.clone()));
    }

    lset.sort();
    lset
}
