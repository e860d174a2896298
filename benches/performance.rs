//! Performance benchmarks for ibenc
//!
//! Covers the CPU-bound pieces of a cycle: report parsing, metric projection
//! and payload encoding. Probe and network time dwarf these in practice, so
//! the numbers mostly guard against accidental regressions.

use clap::Parser;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ibenc::{
    cli::Cli,
    metrics::{test_measurement, MetricProjection},
    probe::parse_report,
    remote::text,
    types::Direction,
    LabelSet, MetricSample, RemoteWriteEncoder,
};

fn labels() -> LabelSet {
    LabelSet::new()
        .with("location", "fra")
        .with("isp_name", "acme")
        .with("package_name", "pro")
}

/// iperf3 report with `streams` parallel streams
fn sample_report(streams: usize) -> String {
    let streams: Vec<serde_json::Value> = (0..streams)
        .map(|i| {
            serde_json::json!({
                "sender": {
                    "socket": 5 + i,
                    "bytes": 106_875_000,
                    "bits_per_second": 85.5e6,
                    "retransmits": 3,
                    "max_rtt": 52_000,
                    "min_rtt": 40_000,
                    "mean_rtt": 45_230,
                    "rtt": 45_230,
                    "rttvar": 2_100
                }
            })
        })
        .collect();

    serde_json::json!({
        "start": { "version": "iperf 3.16", "test_start": { "protocol": "TCP", "duration": 10 } },
        "intervals": [],
        "end": {
            "streams": streams,
            "sum_sent": { "bits_per_second": 85.9e6, "retransmits": 3 },
            "sum_received": { "bits_per_second": 85.5e6 }
        }
    })
    .to_string()
}

/// `cycles` projected measurements, five samples each
fn projected_samples(cycles: usize) -> Vec<MetricSample> {
    let projection = MetricProjection::new(Some("ibenc".to_string()));
    (0..cycles)
        .flat_map(|i| projection.project(&test_measurement(), &labels(), 1_700_000_000_000 + i as i64))
        .collect()
}

fn benchmark_report_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_parsing");

    for streams in [1usize, 4, 16].iter() {
        let raw = sample_report(*streams);
        group.bench_with_input(BenchmarkId::new("parse_report", streams), &raw, |b, raw| {
            b.iter(|| {
                let result = parse_report(black_box(raw), Direction::Download).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

fn benchmark_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    let projection = MetricProjection::new(Some("ibenc".to_string()));
    let measurement = test_measurement();
    let labels = labels();

    group.bench_function("project", |b| {
        b.iter(|| {
            let samples = projection.project(black_box(&measurement), &labels, 1_700_000_000_000);
            black_box(samples);
        });
    });

    group.finish();
}

fn benchmark_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    let encoder = RemoteWriteEncoder::new();

    for cycles in [1usize, 10, 100].iter() {
        let samples = projected_samples(*cycles);
        group.bench_with_input(BenchmarkId::new("snappy_protobuf", cycles), &samples, |b, samples| {
            b.iter(|| {
                let payload = encoder.encode(black_box(samples)).unwrap();
                black_box(payload);
            });
        });
        group.bench_with_input(BenchmarkId::new("text_exposition", cycles), &samples, |b, samples| {
            b.iter(|| {
                let body = text::render(black_box(samples), 1_700_000_000_000);
                black_box(body);
            });
        });
    }

    group.finish();
}

fn benchmark_cli_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("cli_parsing");

    group.bench_function("parse_run_args", |b| {
        let args = vec![
            "ibenc",
            "--server", "iperf.example.net",
            "--port", "5201",
            "--duration", "10",
            "run", "--dry-run",
        ];
        b.iter(|| {
            let cli = Cli::try_parse_from(black_box(&args)).unwrap();
            black_box(cli);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_report_parsing,
    benchmark_projection,
    benchmark_encoding,
    benchmark_cli_parsing
);
criterion_main!(benches);
