//! iperf3 JSON report decoding

use crate::{
    error::{AppError, Result},
    models::DirectionalProbeResult,
    types::Direction,
};
use serde::Deserialize;

const BITS_PER_MEGABIT: f64 = 1_000_000.0;
const MICROS_PER_MILLI: f64 = 1_000.0;

/// Subset of the `iperf3 -J` report this exporter reads
#[derive(Debug, Default, Deserialize)]
pub struct Iperf3Report {
    #[serde(default)]
    pub end: EndSection,
    /// Set by iperf3 when the test aborted after the JSON preamble was written
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndSection {
    #[serde(default)]
    pub streams: Vec<EndStream>,
    #[serde(default)]
    pub sum: Option<Summary>,
    #[serde(default)]
    pub sum_sent: Option<Summary>,
    #[serde(default)]
    pub sum_received: Option<Summary>,
}

/// End-of-test per-stream record
///
/// Recent iperf3 versions nest TCP_INFO values under `sender`; older builds
/// and some forks report them flat on the stream itself.
#[derive(Debug, Default, Deserialize)]
pub struct EndStream {
    #[serde(default)]
    pub sender: Option<StreamSide>,
    #[serde(flatten)]
    pub flat: StreamSide,
}

impl EndStream {
    /// Round-trip time and variance in microseconds
    fn rtt_us(&self) -> (f64, f64) {
        let nested = self.sender.as_ref();
        let rtt = nested
            .and_then(|s| s.rtt.or(s.mean_rtt))
            .or(self.flat.rtt.or(self.flat.mean_rtt))
            .unwrap_or(0.0);
        let rttvar = nested
            .and_then(|s| s.rttvar)
            .or(self.flat.rttvar)
            .unwrap_or(0.0);
        (rtt, rttvar)
    }
}

/// Sender side of a stream record, where TCP_INFO values live
#[derive(Debug, Default, Deserialize)]
pub struct StreamSide {
    /// Smoothed round-trip time, microseconds
    #[serde(default)]
    pub mean_rtt: Option<f64>,
    #[serde(default)]
    pub max_rtt: Option<f64>,
    /// Round-trip time of the last sample, microseconds
    #[serde(default)]
    pub rtt: Option<f64>,
    /// Round-trip time variance, microseconds
    #[serde(default)]
    pub rttvar: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub bits_per_second: f64,
    #[serde(default)]
    pub retransmits: Option<u64>,
}

impl Summary {
    fn rate(summary: &Option<Summary>) -> f64 {
        summary.as_ref().map_or(0.0, |s| s.bits_per_second)
    }
}

/// Decode one raw report into a directional result
pub fn parse_report(raw: &str, direction: Direction) -> Result<DirectionalProbeResult> {
    let report: Iperf3Report = serde_json::from_str(raw).map_err(|e| {
        AppError::probe_execution(format!("failed to parse iperf3 JSON output: {}, output: {}", e, raw))
    })?;

    if let Some(message) = report.error.as_deref().filter(|m| !m.is_empty()) {
        return Err(AppError::probe_execution(format!("iperf3 reported an error: {}", message)));
    }

    Ok(extract(&report, direction))
}

/// Pull throughput, latency and jitter out of a decoded report
///
/// A report without stream records carries no usable measurement, so every
/// value stays at zero even when the summaries are populated.
pub fn extract(report: &Iperf3Report, direction: Direction) -> DirectionalProbeResult {
    let end = &report.end;
    let mut result = DirectionalProbeResult::new(direction, 0.0, 0.0, 0.0);

    let Some(stream) = end.streams.last() else {
        return result;
    };

    let preferred = match direction {
        Direction::Download => Summary::rate(&end.sum_received),
        Direction::Upload => Summary::rate(&end.sum_sent),
    };
    let bits_per_second = if preferred > 0.0 {
        preferred
    } else {
        Summary::rate(&end.sum)
    };

    result.throughput_mbps = bits_per_second / BITS_PER_MEGABIT;
    result.retransmits = end
        .sum_sent
        .as_ref()
        .or(end.sum.as_ref())
        .and_then(|s| s.retransmits)
        .unwrap_or(0);

    let (rtt, rttvar) = stream.rtt_us();
    result.latency_ms = rtt / MICROS_PER_MILLI;
    result.jitter_ms = rttvar / MICROS_PER_MILLI;

    result
}
