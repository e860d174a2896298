//! Configuration data model and validation

use crate::types::{AppError, Result, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote-write endpoint and credentials
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Probe target and run settings
    #[serde(default)]
    pub iperf3: Iperf3Config,

    /// Static labels attached to every sample
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Console and logging preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote-write endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Base URL, `/push` is appended for remote write
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Per-attempt HTTP timeout
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_seconds: u64,

    /// Total attempts when the endpoint answers 429
    #[serde(default = "default_remote_max_attempts")]
    pub max_attempts: u32,

    /// First backoff step, doubled after every 429
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

/// Probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iperf3Config {
    #[serde(default)]
    pub server: String,

    #[serde(default = "default_port")]
    pub port: u32,

    /// Seconds per direction
    #[serde(default = "default_duration")]
    pub duration: u64,

    /// Attempts per direction
    #[serde(default = "default_probe_max_attempts")]
    pub max_attempts: u32,

    /// Probe executable name or path
    #[serde(default = "default_binary")]
    pub binary: String,
}

/// Label values identifying where a measurement comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub isp_name: String,

    #[serde(default)]
    pub package_name: String,

    /// Metric name prefix, `None` or empty for bare names
    #[serde(default = "default_namespace")]
    pub namespace: Option<String>,
}

/// Console output preferences (CLI-only in practice)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: default_remote_timeout_secs(),
            max_attempts: default_remote_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl Default for Iperf3Config {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: default_port(),
            duration: default_duration(),
            max_attempts: default_probe_max_attempts(),
            binary: default_binary(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            location: String::new(),
            isp_name: String::new(),
            package_name: String::new(),
            namespace: default_namespace(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl PrometheusConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Backoff schedule applied to rate-limited writes
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.max_attempts, Duration::from_millis(self.backoff_base_ms))
    }
}

impl Iperf3Config {
    /// Attempts per direction, no wait in between
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::immediate(self.max_attempts)
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.prometheus.url.is_empty() {
            return Err(AppError::config("prometheus.url is required"));
        }
        match url::Url::parse(&self.prometheus.url) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "prometheus.url must use http or https: {}",
                        self.prometheus.url
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid prometheus.url '{}': {}",
                    self.prometheus.url, e
                )));
            }
        }
        if self.prometheus.username.is_empty() {
            return Err(AppError::config("prometheus.username is required"));
        }
        if self.prometheus.password.is_empty() {
            return Err(AppError::config("prometheus.password is required"));
        }
        if self.prometheus.timeout_seconds == 0 {
            return Err(AppError::config("prometheus.timeout_seconds must be greater than 0"));
        }
        if self.prometheus.max_attempts == 0 {
            return Err(AppError::config("prometheus.max_attempts must be greater than 0"));
        }

        if self.iperf3.server.is_empty() {
            return Err(AppError::config("iperf3.server is required"));
        }
        if self.iperf3.port == 0 || self.iperf3.port > 65535 {
            return Err(AppError::config("iperf3.port must be between 1 and 65535"));
        }
        if self.iperf3.duration == 0 {
            return Err(AppError::config("iperf3.duration must be greater than 0"));
        }
        if self.iperf3.max_attempts == 0 {
            return Err(AppError::config("iperf3.max_attempts must be greater than 0"));
        }
        if self.iperf3.binary.is_empty() {
            return Err(AppError::config("iperf3.binary cannot be empty"));
        }

        if self.metrics.location.is_empty() {
            return Err(AppError::config("metrics.location is required"));
        }

        Ok(())
    }

    /// Labels in the fixed order location, isp_name, package_name
    pub fn label_set(&self) -> crate::models::LabelSet {
        crate::models::LabelSet::from_pairs([
            ("location", self.metrics.location.as_str()),
            ("isp_name", self.metrics.isp_name.as_str()),
            ("package_name", self.metrics.package_name.as_str()),
        ])
    }

    /// Metric name prefix, empty strings treated as absent
    pub fn namespace(&self) -> Option<&str> {
        self.metrics.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}

// Default value functions for serde
fn default_port() -> u32 {
    crate::defaults::DEFAULT_IPERF3_PORT
}

fn default_duration() -> u64 {
    crate::defaults::DEFAULT_PROBE_DURATION_SECS
}

fn default_probe_max_attempts() -> u32 {
    crate::defaults::DEFAULT_PROBE_MAX_ATTEMPTS
}

fn default_binary() -> String {
    crate::defaults::DEFAULT_PROBE_BINARY.to_string()
}

fn default_remote_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_REMOTE_TIMEOUT.as_secs()
}

fn default_remote_max_attempts() -> u32 {
    crate::defaults::DEFAULT_REMOTE_MAX_ATTEMPTS
}

fn default_backoff_base_ms() -> u64 {
    crate::defaults::DEFAULT_BACKOFF_BASE.as_millis() as u64
}

fn default_namespace() -> Option<String> {
    Some(crate::defaults::DEFAULT_METRIC_NAMESPACE.to_string())
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
pub(crate) fn sample_config() -> Config {
    let mut config = Config::default();
    config.prometheus.url = "https://prometheus.example.net/api/prom".to_string();
    config.prometheus.username = "123456".to_string();
    config.prometheus.password = "glc_token".to_string();
    config.iperf3.server = "iperf.example.net".to_string();
    config.metrics.location = "fra".to_string();
    config.metrics.isp_name = "acme".to_string();
    config.metrics.package_name = "pro".to_string();
    config
}
