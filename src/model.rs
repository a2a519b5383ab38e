//! Core data model: statistics, typed values, time-value pairs, and the
//! version ordering used to resolve same-timestamp conflicts across
//! overlapping writes.

use std::cmp::Ordering;

/// The per-type value lattice carried by points and by statistics'
/// min/max. The reader never interprets these beyond comparison and
/// pass-through; value filtering and aggregation are external concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I64(i64),
    F64(f64),
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    I64,
    F64,
    Bool,
    Text,
}

/// A single timestamped, typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeValuePair {
    pub timestamp: i64,
    pub value: Value,
}

impl TimeValuePair {
    pub fn new(timestamp: i64, value: Value) -> Self {
        Self { timestamp, value }
    }
}

/// Per-tier summary statistics: min/max timestamp, count, and the typed
/// min/max value if known.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub start_time: i64,
    pub end_time: i64,
    pub count: u64,
    pub min_value: Option<Value>,
    pub max_value: Option<Value>,
}

impl Statistics {
    pub fn new(start_time: i64, end_time: i64, count: u64) -> Self {
        Self {
            start_time,
            end_time,
            count,
            min_value: None,
            max_value: None,
        }
    }

    pub fn with_values(mut self, min_value: Value, max_value: Value) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }
}

/// `(fileVersion, chunkOffset)`, lexicographic, larger is newer. Equality
/// across different files is impossible by construction (`file_version` is
/// unique per file); `chunk_offset` disambiguates chunks within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub file_version: u64,
    pub chunk_offset: u64,
}

impl VersionKey {
    pub fn new(file_version: u64, chunk_offset: u64) -> Self {
        Self {
            file_version,
            chunk_offset,
        }
    }
}

/// An ordered sequence of points with a declared type and direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub data_type: DataType,
    pub direction: crate::direction::Direction,
    points: Vec<TimeValuePair>,
}

impl Batch {
    pub fn new(data_type: DataType, direction: crate::direction::Direction) -> Self {
        Self {
            data_type,
            direction,
            points: Vec::new(),
        }
    }

    pub fn from_points(
        data_type: DataType,
        direction: crate::direction::Direction,
        points: Vec<TimeValuePair>,
    ) -> Self {
        Self {
            data_type,
            direction,
            points,
        }
    }

    pub fn push(&mut self, point: TimeValuePair) {
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeValuePair> {
        self.points.iter()
    }

    pub fn into_points(self) -> Vec<TimeValuePair> {
        self.points
    }

    /// True iff `points` is monotone in `direction` — the property every
    /// emitted batch must hold.
    pub fn is_monotone(&self) -> bool {
        self.points.windows(2).all(|w| {
            let ord = w[0].timestamp.cmp(&w[1].timestamp);
            match self.direction {
                crate::direction::Direction::Asc => ord != Ordering::Greater,
                crate::direction::Direction::Desc => ord != Ordering::Less,
            }
        })
    }
}

/// Opaque identifier for "a given series identity". The spec leaves the
/// representation unspecified; this models it as an owned path, mirroring
/// the `seriesPath` construction input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId(pub String);

impl From<&str> for SeriesId {
    fn from(value: &str) -> Self {
        SeriesId(value.to_string())
    }
}

impl From<String> for SeriesId {
    fn from(value: String) -> Self {
        SeriesId(value)
    }
}

/// Opaque predicate pushed down to page loading. The core never
/// interprets it; filter compilation is out of scope.
#[derive(Debug, Clone, Default)]
pub struct TimeFilter(pub Option<(i64, i64)>);

impl TimeFilter {
    pub fn none() -> Self {
        TimeFilter(None)
    }

    pub fn range(start: i64, end: i64) -> Self {
        TimeFilter(Some((start, end)))
    }

    pub fn accepts(&self, timestamp: i64) -> bool {
        match self.0 {
            None => true,
            Some((start, end)) => timestamp >= start && timestamp <= end,
        }
    }
}

/// Opaque value predicate pushed down only to non-overlapped pages (spec
/// §6: overlapping resolution discards based on version, not value).
#[derive(Clone)]
pub enum ValueFilter {
    None,
    Predicate(std::sync::Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl std::fmt::Debug for ValueFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueFilter::None => f.write_str("ValueFilter::None"),
            ValueFilter::Predicate(_) => f.write_str("ValueFilter::Predicate(..)"),
        }
    }
}

impl Default for ValueFilter {
    fn default() -> Self {
        ValueFilter::None
    }
}

impl ValueFilter {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueFilter::None => true,
            ValueFilter::Predicate(f) => f(value),
        }
    }
}

/// Caller-supplied context threaded opaquely through metadata loads (query
/// id for telemetry keying, cancellation scope, and so on).
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub query_id: u64,
}

impl QueryContext {
    pub fn new(query_id: u64) -> Self {
        Self { query_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    #[test]
    fn version_key_orders_lexicographically() {
        let a = VersionKey::new(1, 5);
        let b = VersionKey::new(1, 9);
        let c = VersionKey::new(2, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn batch_monotone_check() {
        let mut b = Batch::new(DataType::I64, Direction::Asc);
        b.push(TimeValuePair::new(1, Value::I64(1)));
        b.push(TimeValuePair::new(2, Value::I64(2)));
        assert!(b.is_monotone());
        b.push(TimeValuePair::new(1, Value::I64(3)));
        assert!(!b.is_monotone());
    }

    #[test]
    fn time_filter_accepts_range() {
        let f = TimeFilter::range(5, 10);
        assert!(!f.accepts(4));
        assert!(f.accepts(5));
        assert!(f.accepts(10));
        assert!(!f.accepts(11));
        assert!(TimeFilter::none().accepts(i64::MIN));
    }
}
