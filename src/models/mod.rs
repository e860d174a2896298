//! Data models and structures for the bandwidth benchmark exporter

pub mod config;
pub mod measurement;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use measurement::{CombinedMeasurement, DirectionalProbeResult, PacketLoss};
pub use metrics::{LabelSet, MetricKind, MetricSample, MetricValue};
