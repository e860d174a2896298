//! Environment variable overrides and .env file management

use crate::{
    error::{AppError, ErrorContext, Result},
    models::Config,
};
use std::path::Path;

pub const ENV_PROMETHEUS_URL: &str = "IBENC_PROMETHEUS_URL";
pub const ENV_PROMETHEUS_USER: &str = "IBENC_PROMETHEUS_USER";
pub const ENV_PROMETHEUS_PASS: &str = "IBENC_PROMETHEUS_PASS";
pub const ENV_SERVER: &str = "IBENC_SERVER";
pub const ENV_PORT: &str = "IBENC_PORT";
pub const ENV_DURATION: &str = "IBENC_DURATION";
pub const ENV_LOCATION: &str = "IBENC_LOCATION";
pub const ENV_ISP_NAME: &str = "IBENC_ISP_NAME";
pub const ENV_PACKAGE_NAME: &str = "IBENC_PACKAGE_NAME";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
            if debug {
                println!("Loaded environment from {}", path.display());
            }
        } else if debug {
            println!("No .env file found, using configuration file and CLI arguments");
        }

        Ok(())
    }

    /// Apply overrides using `lookup` as the variable source
    ///
    /// Unset and empty variables leave the file value in place.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_PROMETHEUS_URL) {
            config.prometheus.url = url;
        }
        if let Some(username) = get(ENV_PROMETHEUS_USER) {
            config.prometheus.username = username;
        }
        if let Some(password) = get(ENV_PROMETHEUS_PASS) {
            config.prometheus.password = password;
        }
        if let Some(server) = get(ENV_SERVER) {
            config.iperf3.server = server;
        }
        if let Some(port) = get(ENV_PORT) {
            Self::validate_env_var(ENV_PORT, &port)?;
            config.iperf3.port = port.trim().parse()?;
        }
        if let Some(duration) = get(ENV_DURATION) {
            Self::validate_env_var(ENV_DURATION, &duration)?;
            config.iperf3.duration = duration.trim().parse()?;
        }
        if let Some(location) = get(ENV_LOCATION) {
            config.metrics.location = location;
        }
        if let Some(isp_name) = get(ENV_ISP_NAME) {
            config.metrics.isp_name = isp_name;
        }
        if let Some(package_name) = get(ENV_PACKAGE_NAME) {
            config.metrics.package_name = package_name;
        }

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            ENV_PROMETHEUS_URL => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("{} must use http or https: {}", key, value)));
                }
            }
            ENV_PORT => {
                let port: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if port == 0 || port > 65535 {
                    return Err(AppError::config(format!("{} must be between 1 and 65535, got: {}", key, port)));
                }
            }
            ENV_DURATION => {
                let duration: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if duration == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            _ => {
                // Free-form strings
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            (ENV_PROMETHEUS_URL, "Remote-write base URL", "https://prometheus.example.net/api/prom"),
            (ENV_PROMETHEUS_USER, "Basic auth username", "123456"),
            (ENV_PROMETHEUS_PASS, "Basic auth password or API token", "glc_..."),
            (ENV_SERVER, "iperf3 server host", "iperf.example.net"),
            (ENV_PORT, "iperf3 server port (1-65535)", "5201"),
            (ENV_DURATION, "Seconds per probe direction", "10"),
            (ENV_LOCATION, "location label", "fra"),
            (ENV_ISP_NAME, "isp_name label", "acme"),
            (ENV_PACKAGE_NAME, "package_name label", "pro"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables (including .env)\n");
        help.push_str("  3. Configuration file\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::validate_env_from(|key| std::env::var(key).ok())
    }

    /// Warnings for every supported variable `lookup` returns a bad value for
    pub fn validate_env_from<F>(lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = lookup(name)?;
                Self::validate_env_var(name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Example configuration file content
    pub fn create_example_config_content() -> String {
        r#"# iperf3 bandwidth exporter configuration
#
# Every value can be overridden with the matching IBENC_* environment
# variable (see `ibenc --help`).

prometheus:
  # Base URL; /push is appended for remote write
  url: https://prometheus.example.net/api/prom
  username: "123456"
  password: glc_replace_me
  # timeout_seconds: 30
  # max_attempts: 3
  # backoff_base_ms: 1000

iperf3:
  server: iperf.example.net
  port: 5201
  duration: 10
  # max_attempts: 2
  # binary: iperf3

metrics:
  location: fra
  isp_name: acme
  package_name: pro
  # namespace: ibenc
"#
        .to_string()
    }

    /// Save example configuration file to disk, refusing to replace one unless `force`
    pub fn save_example_config_file(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::config(format!(
                "{} already exists, pass --force to overwrite it",
                path.display()
            )));
        }
        std::fs::write(path, Self::create_example_config_content())
            .with_context(|| format!("failed to write example config file {}", path.display()))
    }
}
