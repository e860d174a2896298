//! Prometheus text exposition rendering

use crate::models::{MetricSample, MetricValue};
use std::fmt::Write;

/// Render samples as exposition text
///
/// Consecutive samples of the same name share one `# HELP`/`# TYPE` header.
/// Samples with no scalar value are left out; missing timestamps use `now_ms`.
pub fn render(samples: &[MetricSample], now_ms: i64) -> String {
    let mut out = String::new();
    let mut current_family: Option<&str> = None;

    for sample in samples {
        let Some(value) = sample.value else {
            continue;
        };

        if current_family != Some(sample.name.as_str()) {
            let _ = writeln!(out, "# HELP {} {}", sample.name, escape_help(&sample.help));
            let _ = writeln!(out, "# TYPE {} {}", sample.name, sample.kind);
            current_family = Some(sample.name.as_str());
        }

        out.push_str(&sample.name);
        if !sample.labels.is_empty() {
            out.push('{');
            for (i, (name, label_value)) in sample.labels.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}=\"{}\"", name, escape_label_value(label_value));
            }
            out.push('}');
        }
        let _ = writeln!(
            out,
            " {} {}",
            format_value(value),
            sample.timestamp_ms.unwrap_or(now_ms)
        );
    }

    out
}

fn format_value(value: MetricValue) -> String {
    let v = value.as_f64();
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        v.to_string()
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{test_measurement, MetricProjection};
    use crate::models::{LabelSet, MetricKind};

    #[test]
    fn test_renders_projection() {
        let labels = LabelSet::new().with("location", "fra").with("isp_name", "acme");
        let samples = MetricProjection::new(None).project(&test_measurement(), &labels, 1_700_000_000_000);
        let text = render(&samples, 0);

        let expected_head = "# HELP download_speed_mbps Download speed in Mbps\n\
                             # TYPE download_speed_mbps gauge\n\
                             download_speed_mbps{location=\"fra\",isp_name=\"acme\"} 85.5 1700000000000\n";
        assert!(text.starts_with(expected_head), "got:\n{}", text);
        assert!(text.contains("latency_ms{location=\"fra\",isp_name=\"acme\"} 45.23 1700000000000\n"));
        assert!(text.contains("packet_loss_percent{location=\"fra\",isp_name=\"acme\"} 0 1700000000000\n"));
        assert_eq!(text.matches("# HELP").count(), 5);
        assert_eq!(text.matches("# TYPE").count(), 5);
    }

    #[test]
    fn test_label_values_are_escaped() {
        let labels = LabelSet::new().with("isp_name", "a\"b\\c\nd");
        let sample = MetricSample::gauge("jitter_ms", "Jitter", 1.0, labels, 5);
        let text = render(&[sample], 0);
        assert!(text.contains(r#"jitter_ms{isp_name="a\"b\\c\nd"} 1 5"#));
    }

    #[test]
    fn test_label_less_sample_omits_braces() {
        let mut sample = MetricSample::gauge("up", "Target up", 1.0, LabelSet::new(), 0);
        sample.timestamp_ms = None;
        let text = render(&[sample], 99);
        assert!(text.ends_with("\nup 1 99\n"));
    }

    #[test]
    fn test_samples_without_value_are_omitted() {
        let sample = MetricSample {
            name: "request_duration_seconds".to_string(),
            help: String::new(),
            kind: MetricKind::Histogram,
            value: None,
            labels: LabelSet::new(),
            timestamp_ms: None,
        };
        assert_eq!(render(&[sample], 0), "");
    }

    #[test]
    fn test_counter_type_line() {
        let mut sample = MetricSample::gauge("runs_total", "Runs", 3.0, LabelSet::new(), 1);
        sample.kind = MetricKind::Counter;
        sample.value = Some(MetricValue::Counter(3.0));
        assert!(render(&[sample], 0).contains("# TYPE runs_total counter\n"));
    }
}
