//! Configuration loading: YAML file, environment, then CLI arguments

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Configuration parser that layers file, environment and CLI values
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.cli.debug)?;
        self.parse_with_env(|key| std::env::var(key).ok())
    }

    /// Same as [`parse`](Self::parse) with an explicit variable source and no `.env` loading
    pub fn parse_with_env<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load_file()?;
        EnvManager::apply_overrides_from(&mut config, lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Read the YAML file, tolerating a missing default file
    fn load_file(&self) -> Result<Config> {
        let path = expand_tilde(self.cli.config_path());

        if !path.exists() && !self.cli.has_explicit_config() {
            if self.cli.debug {
                println!("No {} found, using defaults and environment", path.display());
            }
            return Ok(Config::default());
        }

        load_config_file(&path)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref server) = self.cli.server {
            config.iperf3.server = server.clone();
        }
        if let Some(port) = self.cli.port {
            config.iperf3.port = port;
        }
        if let Some(duration) = self.cli.duration {
            config.iperf3.duration = duration;
        }

        if self.cli.no_color {
            config.output.enable_color = false;
        }
        config.output.verbose = self.cli.verbose;
        config.output.debug = self.cli.debug;
    }
}

/// Read and deserialize a YAML configuration file
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::config(format!("failed to read config file {}: {}", path.display(), e)))?;

    serde_yaml::from_str(&content)
        .map_err(|e| AppError::config(format!("failed to parse config file {}: {}", path.display(), e)))
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    expand_tilde_with(path, || {
        std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))
    })
}

/// Same as [`expand_tilde`] with an explicit home directory source
pub fn expand_tilde_with<F>(path: &Path, home: F) -> PathBuf
where
    F: FnOnce() -> Option<OsString>,
{
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match home() {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Endpoint: {}", config.prometheus.url));
    summary.push(format!("Username: {}", config.prometheus.username));
    summary.push(format!("Password: {}", mask_secret(&config.prometheus.password)));
    summary.push(format!(
        "iperf3 Server: {}:{} ({}s per direction, {} attempts)",
        config.iperf3.server, config.iperf3.port, config.iperf3.duration, config.iperf3.max_attempts
    ));
    summary.push(format!(
        "Labels: location={} isp_name={} package_name={}",
        config.metrics.location, config.metrics.isp_name, config.metrics.package_name
    ));
    summary.push(format!("Namespace: {}", config.namespace().unwrap_or("(none)")));
    summary.push(format!("Color Output: {}", config.output.enable_color));
    summary.push(format!("Verbose: {}", config.output.verbose));
    summary.push(format!("Debug: {}", config.output.debug));

    summary.join("\n")
}

fn mask_secret(secret: &str) -> String {
    match secret.chars().count() {
        0 => "(empty)".to_string(),
        n if n <= 4 => "*".repeat(n),
        _ => format!("{}***", secret.chars().take(4).collect::<String>()),
    }
}
