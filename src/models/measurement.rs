//! Probe measurement data models and the direction merge rules

use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// Outcome of one probe run in one direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalProbeResult {
    pub direction: Direction,
    /// Throughput in megabits per second
    pub throughput_mbps: f64,
    /// Round-trip time of the last reported stream, milliseconds
    pub latency_ms: f64,
    /// Round-trip time variance of the last reported stream, milliseconds
    pub jitter_ms: f64,
    /// Retransmits reported by the end-of-test summary
    pub retransmits: u64,
}

impl DirectionalProbeResult {
    pub fn new(direction: Direction, throughput_mbps: f64, latency_ms: f64, jitter_ms: f64) -> Self {
        Self {
            direction,
            throughput_mbps,
            latency_ms,
            jitter_ms,
            retransmits: 0,
        }
    }
}

/// Packet loss as reported downstream
///
/// iperf3 TCP runs do not report loss, so every measurement currently carries
/// `NotMeasured`, which projects to 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PacketLoss {
    #[default]
    NotMeasured,
    Percent(f64),
}

impl PacketLoss {
    pub fn as_percent(&self) -> f64 {
        match self {
            PacketLoss::NotMeasured => 0.0,
            PacketLoss::Percent(value) => *value,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, PacketLoss::Percent(_))
    }
}

/// Result of a dual-direction run, the record sent downstream
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedMeasurement {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub packet_loss: PacketLoss,
}

impl CombinedMeasurement {
    /// Packet loss percent, zero while loss is not measured
    pub fn packet_loss_percent(&self) -> f64 {
        self.packet_loss.as_percent()
    }

    /// At least one direction produced throughput
    pub fn is_reportable(&self) -> bool {
        self.download_mbps != 0.0 || self.upload_mbps != 0.0
    }

    /// Fold one directional result into this measurement
    ///
    /// Throughput goes to the matching direction; latency and jitter keep the
    /// smaller non-zero reading seen so far.
    pub fn absorb(&mut self, result: &DirectionalProbeResult) {
        match result.direction {
            Direction::Download => self.download_mbps = result.throughput_mbps,
            Direction::Upload => self.upload_mbps = result.throughput_mbps,
        }
        self.latency_ms = min_non_zero(self.latency_ms, result.latency_ms);
        self.jitter_ms = min_non_zero(self.jitter_ms, result.jitter_ms);
    }

    /// Combine optional download and upload results
    pub fn merge(download: Option<&DirectionalProbeResult>, upload: Option<&DirectionalProbeResult>) -> Self {
        let mut combined = Self::default();
        for result in download.into_iter().chain(upload) {
            combined.absorb(result);
        }
        combined
    }
}

/// Smaller of two readings where zero means "no reading"
pub fn min_non_zero(a: f64, b: f64) -> f64 {
    match (a > 0.0, b > 0.0) {
        (true, true) => a.min(b),
        (true, false) => a,
        (false, true) => b,
        (false, false) => 0.0,
    }
}
