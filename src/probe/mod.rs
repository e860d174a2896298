//! Bandwidth probe invocation
//!
//! The probe itself is the external `iperf3` executable. This module owns the
//! subprocess contract (`-c <server> -p <port> -t <duration> -J [-R]`) behind
//! the [`ProbeRunner`] trait so the orchestrator can be driven by a fake
//! runner in tests, and decodes the JSON report it prints.

pub mod report;

pub use report::{parse_report, Iperf3Report};

use crate::{
    error::{AppError, Result},
    types::Direction,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::process::Command;

/// Where and how long to probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub duration_secs: u64,
}

impl ProbeTarget {
    pub fn new<S: Into<String>>(host: S, port: u16, duration_secs: u64) -> Self {
        Self {
            host: host.into(),
            port,
            duration_secs,
        }
    }

    /// Request for one run in `direction`
    pub fn request(&self, direction: Direction) -> ProbeRequest {
        ProbeRequest {
            target: self.clone(),
            direction,
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A single probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub target: ProbeTarget,
    pub direction: Direction,
}

impl ProbeRequest {
    /// Command-line arguments for the probe executable
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            self.target.host.clone(),
            "-p".to_string(),
            self.target.port.to_string(),
            "-t".to_string(),
            self.target.duration_secs.to_string(),
            "-J".to_string(),
        ];
        if self.direction.is_reverse() {
            args.push("-R".to_string());
        }
        args
    }
}

/// Capability to execute one probe run and return its raw JSON report
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    async fn run(&self, request: &ProbeRequest) -> Result<String>;
}

/// Runs the real `iperf3` executable
#[derive(Debug, Clone)]
pub struct Iperf3Runner {
    binary: String,
}

impl Iperf3Runner {
    pub fn new<S: Into<String>>(binary: S) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for Iperf3Runner {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_PROBE_BINARY)
    }
}

#[async_trait]
impl ProbeRunner for Iperf3Runner {
    async fn run(&self, request: &ProbeRequest) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(request.args())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::probe_execution(format!("failed to start {}: {}", self.binary, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::probe_execution(format!(
                "{} command failed: {}, output: {}",
                self.binary,
                output.status,
                join_output(&stdout, &stderr)
            )));
        }

        Ok(stdout.into_owned())
    }
}

/// Non-empty stdout and stderr, separated so the two streams stay readable
fn join_output(stdout: &str, stderr: &str) -> String {
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
