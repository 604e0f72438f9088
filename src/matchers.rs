//! Query matcher model and the equality lookup used for translation.
//!
//! Inbound queries carry label matchers. This core only acts on equality
//! matchers: other operator kinds can be represented so a query containing
//! them does not crash the translator, but they are dropped silently when the
//! lookup map is built.

use fnv::FnvHashMap;

/// Matcher operator kinds carried by an inbound query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    /// Exact value equality. The only operator the translator acts on.
    Eq,
    /// Value inequality; dropped during translation.
    NotEq,
    /// Regex match; dropped during translation.
    Re,
    /// Negated regex match; dropped during translation.
    NotRe,
}

/// A query predicate binding a label name to a required value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    pub name: String,
    pub op: MatchOp,
    pub value: String,
}

impl Matcher {
    /// Create a new matcher.
    pub fn new(name: impl Into<String>, op: MatchOp, value: impl Into<String>) -> Self {
        Self { name: name.into(), op, value: value.into() }
    }

    /// Create an equality matcher, the common case.
    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MatchOp::Eq, value)
    }
}

/// Build a by-name lookup over the equality matchers of a query.
///
/// Non-equality matchers are skipped. Duplicate names resolve deterministically
/// to the last matcher in slice order.
///
/// # Parameters
///
/// - `matchers` - The query's matcher list, in query order
///
/// # Returns
///
/// Returns a map from label name to the winning equality matcher.
pub fn equality_lookup(matchers: &[Matcher]) -> FnvHashMap<&str, &Matcher> {
    let mut lookup = FnvHashMap::default();
    for matcher in matchers {
        if matcher.op == MatchOp::Eq {
            lookup.insert(matcher.name.as_str(), matcher);
        }
    }
    lookup
}
