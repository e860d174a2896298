//! Configuration validation utilities and rules

use crate::{error::Result, models::Config};
use colored::Colorize;
use std::net::IpAddr;

/// Probe durations above this many seconds draw a warning
const LONG_PROBE_SECS: u64 = 60;
/// Probe durations below this rarely reach steady-state throughput
const SHORT_PROBE_SECS: u64 = 3;

/// Configuration validator with advisory checks on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration and collect non-fatal warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_endpoint(&config.prometheus.url));
        warnings.extend(Self::validate_probe_settings(config));
        warnings.extend(Self::validate_labels(config));
        Ok(warnings)
    }

    fn validate_endpoint(url: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let Ok(parsed) = url::Url::parse(url) else {
            return warnings;
        };

        if parsed.scheme() == "http" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Endpoint '{}' uses HTTP, credentials will be sent in clear text", url),
            ));
        }

        if parsed.path().trim_end_matches('/').ends_with("/push") {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Endpoint '{}' already ends in /push; requests will go to '{}/push'", url, url.trim_end_matches('/')),
            ));
        }

        if parsed.query().is_some() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Endpoint '{}' includes query parameters, which are kept on every request", url),
            ));
        }

        warnings
    }

    fn validate_probe_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let probe = &config.iperf3;

        if probe.duration > LONG_PROBE_SECS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Probe duration of {}s per direction makes each cycle take over {}s",
                    probe.duration,
                    probe.duration.saturating_mul(2)
                ),
            ));
        } else if probe.duration < SHORT_PROBE_SECS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Probe duration of {}s may not reach steady-state throughput", probe.duration),
            ));
        }

        if let Ok(ip) = probe.server.parse::<IpAddr>() {
            if ip.is_loopback() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("iperf3 server {} is a loopback address", ip),
                ));
            }
        }

        if probe.port != crate::defaults::DEFAULT_IPERF3_PORT {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("iperf3 server uses non-default port {}", probe.port),
            ));
        }

        warnings
    }

    fn validate_labels(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (name, value) in [
            ("isp_name", &config.metrics.isp_name),
            ("package_name", &config.metrics.package_name),
        ] {
            if value.is_empty() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("metrics.{} is empty; samples will carry an empty {} label", name, name),
                ));
            }
        }

        if let Some(namespace) = config.namespace() {
            let valid = namespace
                .chars()
                .enumerate()
                .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
            if !valid {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("metrics.namespace '{}' is not a valid Prometheus metric name prefix", namespace),
                ));
            }
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if !use_color {
            return format!("{} {}", tag, self.message);
        }
        let tag = match self.level {
            ValidationLevel::Info => tag.blue(),
            ValidationLevel::Warning => tag.yellow(),
        };
        format!("{} {}", tag, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
