//! Metric sample data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered label pairs attached to a sample
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Append a label, keeping insertion order
    pub fn with<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Declared family type, used for the exposition `# TYPE` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Gauge,
    Counter,
    Untyped,
    Histogram,
    Summary,
}

impl MetricKind {
    /// Lowercase name used in text exposition
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Untyped => "untyped",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single numeric value of a scalar metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Gauge(f64),
    Counter(f64),
    Untyped(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Gauge(v) | MetricValue::Counter(v) | MetricValue::Untyped(v) => *v,
        }
    }
}

/// One named, labelled value captured at a point in time
///
/// `value` is `None` for families this exporter cannot flatten into a single
/// number (histograms, summaries, or a family with no value set); such samples
/// are skipped by the encoders. A `None` timestamp is stamped at encode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub value: Option<MetricValue>,
    pub labels: LabelSet,
    pub timestamp_ms: Option<i64>,
}

impl MetricSample {
    /// Create a gauge sample
    pub fn gauge<N: Into<String>, H: Into<String>>(
        name: N,
        help: H,
        value: f64,
        labels: LabelSet,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind: MetricKind::Gauge,
            value: Some(MetricValue::Gauge(value)),
            labels,
            timestamp_ms: Some(timestamp_ms),
        }
    }

    /// Numeric value when the sample carries a scalar one
    pub fn scalar(&self) -> Option<f64> {
        self.value.map(|v| v.as_f64())
    }
}
