//! Command-line interface

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// `--version` output with build information
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nbuilt:  ",
    env!("BUILD_TIME"),
    "\ntarget: ",
    env!("TARGET_TRIPLE"),
);

/// Measure bandwidth with iperf3 and push the results to Prometheus
#[derive(Parser, Debug, Clone)]
#[command(name = "ibenc")]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Configuration file [default: ibenc.yaml]
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the iperf3 server host
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Override the iperf3 server port
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=65535))]
    pub port: Option<u32>,

    /// Override the probe duration per direction, in seconds
    #[arg(long, global = true, value_parser = parse_duration)]
    pub duration: Option<u64>,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output (JSON logs)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run both probe directions and report the result (default)
    Run(RunArgs),
    /// Send fixed sample values to check connectivity with the backend
    SendTest,
    /// Print one sample field by field, then send it
    DebugMetric,
    /// List the IBENC_* environment variables and check the ones currently set
    EnvHelp,
    /// Write an example configuration file to the --config path
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Send text exposition to /metrics/write instead of remote write
    #[arg(long)]
    pub text: bool,

    /// Probe and print the samples without sending them
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Subcommand to execute, `run` when none was given
    pub fn action(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(RunArgs::default()))
    }

    /// Configuration file to read
    pub fn config_path(&self) -> &Path {
        self.config
            .as_deref()
            .unwrap_or_else(|| Path::new(crate::defaults::DEFAULT_CONFIG_PATH))
    }

    /// Whether `--config` was given explicitly
    pub fn has_explicit_config(&self) -> bool {
        self.config.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::parse_from(["ibenc"]);
        assert_eq!(cli.action(), Command::Run(RunArgs::default()));
        assert_eq!(cli.config_path(), Path::new("ibenc.yaml"));
        assert!(!cli.has_explicit_config());
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from(["ibenc", "run", "--text", "--dry-run"]);
        assert_eq!(cli.action(), Command::Run(RunArgs { text: true, dry_run: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ibenc", "send-test", "--config", "/etc/ibenc.yaml", "--debug"]);
        assert_eq!(cli.action(), Command::SendTest);
        assert_eq!(cli.config_path(), Path::new("/etc/ibenc.yaml"));
        assert!(cli.debug);
    }

    #[test]
    fn test_setup_commands() {
        assert_eq!(Cli::parse_from(["ibenc", "env-help"]).action(), Command::EnvHelp);
        let cli = Cli::parse_from(["ibenc", "init-config", "--force", "-c", "custom.yaml"]);
        assert_eq!(cli.action(), Command::InitConfig(InitConfigArgs { force: true }));
        assert_eq!(cli.config_path(), Path::new("custom.yaml"));
    }

    #[test]
    fn test_probe_overrides() {
        let cli = Cli::parse_from(["ibenc", "--server", "10.0.0.1", "--port", "5202", "--duration", "5", "debug-metric"]);
        assert_eq!(cli.server.as_deref(), Some("10.0.0.1"));
        assert_eq!(cli.port, Some(5202));
        assert_eq!(cli.duration, Some(5));
        assert_eq!(cli.action(), Command::DebugMetric);
    }

    #[test]
    fn test_port_range() {
        assert!(Cli::try_parse_from(["ibenc", "--port", "0"]).is_err());
        assert!(Cli::try_parse_from(["ibenc", "--port", "65536"]).is_err());
        assert!(Cli::try_parse_from(["ibenc", "--port", "65535"]).is_ok());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("10"), Ok(10));
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("0x10").is_err());
        assert!(parse_duration("ten").is_err());
    }

    #[test]
    fn test_no_color_disables_colors() {
        let cli = Cli::parse_from(["ibenc", "--no-color"]);
        assert!(!cli.use_colors());
    }
}
