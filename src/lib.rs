//! iperf3 bandwidth exporter
//!
//! Runs a download and an upload iperf3 probe against one server, merges the
//! two results into a single measurement and ships it to a Prometheus
//! remote-write endpoint (or, alternatively, as text exposition).

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod output;
pub mod probe;
pub mod remote;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::DualDirectionOrchestrator;
pub use metrics::MetricProjection;
pub use models::{CombinedMeasurement, Config, DirectionalProbeResult, LabelSet, MetricSample};
pub use probe::{Iperf3Runner, ProbeRunner, ProbeTarget};
pub use remote::{RemoteWriteConfig, RemoteWriteEncoder, RemoteWriter};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_CONFIG_PATH: &str = "ibenc.yaml";
    pub const DEFAULT_IPERF3_PORT: u32 = 5201;
    pub const DEFAULT_PROBE_DURATION_SECS: u64 = 10;
    pub const DEFAULT_PROBE_MAX_ATTEMPTS: u32 = 2;
    pub const DEFAULT_PROBE_BINARY: &str = "iperf3";
    pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_REMOTE_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
    pub const DEFAULT_METRIC_NAMESPACE: &str = "ibenc";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
