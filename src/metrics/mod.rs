//! Projection of a combined measurement into named gauge samples

use crate::models::{CombinedMeasurement, LabelSet, MetricSample};
use chrono::Utc;

/// Base metric families in emission order, with their help text
pub const METRIC_FAMILIES: [(&str, &str); 5] = [
    ("download_speed_mbps", "Download speed in Mbps"),
    ("upload_speed_mbps", "Upload speed in Mbps"),
    ("jitter_ms", "Jitter in milliseconds"),
    ("latency_ms", "Latency in milliseconds"),
    ("packet_loss_percent", "Packet loss percentage"),
];

/// Maps a [`CombinedMeasurement`] onto the five exported gauges
#[derive(Debug, Clone, Default)]
pub struct MetricProjection {
    namespace: Option<String>,
}

impl MetricProjection {
    /// `namespace` prefixes every family as `<namespace>_<name>`
    pub fn new(namespace: Option<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Fully qualified family name
    pub fn metric_name(&self, base: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}_{}", ns, base),
            None => base.to_string(),
        }
    }

    /// Project with an explicit timestamp; every sample shares it
    pub fn project(&self, measurement: &CombinedMeasurement, labels: &LabelSet, timestamp_ms: i64) -> Vec<MetricSample> {
        let values = [
            measurement.download_mbps,
            measurement.upload_mbps,
            measurement.jitter_ms,
            measurement.latency_ms,
            measurement.packet_loss_percent(),
        ];

        METRIC_FAMILIES
            .iter()
            .zip(values)
            .map(|((name, help), value)| {
                MetricSample::gauge(self.metric_name(name), *help, value, labels.clone(), timestamp_ms)
            })
            .collect()
    }

    /// Project stamped with the current wall-clock time
    pub fn project_now(&self, measurement: &CombinedMeasurement, labels: &LabelSet) -> Vec<MetricSample> {
        self.project(measurement, labels, Utc::now().timestamp_millis())
    }

    /// Fixed download, upload and latency samples for a connectivity check
    pub fn test_samples(&self, labels: &LabelSet) -> Vec<MetricSample> {
        let wanted: Vec<String> = TEST_FAMILIES.iter().map(|base| self.metric_name(base)).collect();
        self.project_now(&test_measurement(), labels)
            .into_iter()
            .filter(|sample| wanted.contains(&sample.name))
            .collect()
    }
}

const TEST_FAMILIES: [&str; 3] = ["download_speed_mbps", "upload_speed_mbps", "latency_ms"];

/// Fixed measurement used to check the delivery path without probing
pub fn test_measurement() -> CombinedMeasurement {
    CombinedMeasurement {
        download_mbps: 85.5,
        upload_mbps: 42.3,
        latency_ms: 45.23,
        jitter_ms: 2.1,
        ..Default::default()
    }
}
