//! Console rendering of measurements and samples

use crate::models::{CombinedMeasurement, MetricSample};
use colored::*;
use std::fmt::Write as _;

/// Rough throughput classification for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputLevel {
    Fast,     // >= 100 Mbps
    Moderate, // 10-100 Mbps
    Slow,     // > 0 Mbps
    Idle,
}

impl ThroughputLevel {
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps >= 100.0 {
            Self::Fast
        } else if mbps >= 10.0 {
            Self::Moderate
        } else if mbps > 0.0 {
            Self::Slow
        } else {
            Self::Idle
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Cyan,
            Self::Slow => Color::Yellow,
            Self::Idle => Color::Red,
        }
    }
}

/// Formats measurement results for the terminal, colored or plain
#[derive(Debug, Clone, Copy)]
pub struct MeasurementFormatter {
    use_color: bool,
}

impl MeasurementFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn header(&self, title: &str) -> String {
        if self.use_color {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    fn throughput(&self, mbps: f64) -> String {
        let text = format!("{:.2} Mbps", mbps);
        if self.use_color {
            text.color(ThroughputLevel::from_mbps(mbps).color()).to_string()
        } else {
            text
        }
    }

    /// Result block for one benchmark cycle
    pub fn format_measurement(&self, measurement: &CombinedMeasurement, target: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.header(&format!("Bandwidth test results ({})", target)));
        let _ = writeln!(out, "  Download:    {}", self.throughput(measurement.download_mbps));
        let _ = writeln!(out, "  Upload:      {}", self.throughput(measurement.upload_mbps));
        let _ = writeln!(out, "  Latency:     {:.2} ms", measurement.latency_ms);
        let _ = writeln!(out, "  Jitter:      {:.2} ms", measurement.jitter_ms);
        let loss = if measurement.packet_loss.is_measured() {
            format!("{:.2} %", measurement.packet_loss_percent())
        } else {
            format!("{:.2} % (not measured)", measurement.packet_loss_percent())
        };
        let _ = write!(out, "  Packet Loss: {}", loss);
        out
    }

    /// One line per sample, as sent downstream
    pub fn format_samples(&self, samples: &[MetricSample]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.header(&format!("Samples ({})", samples.len())));
        for sample in samples {
            let labels: Vec<String> = sample
                .labels
                .iter()
                .map(|(name, value)| format!("{}=\"{}\"", name, value))
                .collect();
            let value = sample
                .scalar()
                .map_or_else(|| "-".to_string(), |v| v.to_string());
            let _ = writeln!(out, "  {}{{{}}} {}", sample.name, labels.join(","), value);
        }
        out.trim_end().to_string()
    }

    /// Every field of a single sample
    pub fn format_sample_detail(&self, sample: &MetricSample) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.header("Metric sample"));
        let _ = writeln!(out, "  Name:      {}", sample.name);
        let _ = writeln!(out, "  Help:      {}", sample.help);
        let _ = writeln!(out, "  Type:      {}", sample.kind);
        let _ = writeln!(
            out,
            "  Value:     {}",
            sample.scalar().map_or_else(|| "(none)".to_string(), |v| v.to_string())
        );
        match sample.timestamp_ms {
            Some(ts) => {
                let rendered = chrono::DateTime::from_timestamp_millis(ts)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default();
                let _ = writeln!(out, "  Timestamp: {} ({})", ts, rendered);
            }
            None => {
                let _ = writeln!(out, "  Timestamp: (stamped at send time)");
            }
        }
        let _ = write!(out, "  Labels:");
        for (name, value) in sample.labels.iter() {
            let _ = write!(out, "\n    {} = {}", name, value);
        }
        out
    }

    /// Outcome line after a successful send
    pub fn format_sent(&self, series: usize, endpoint: &str) -> String {
        let text = format!("Sent {} series to {}", series, endpoint);
        if self.use_color {
            format!("{} {}", "✓".green(), text)
        } else {
            text
        }
    }
}
