//! Remote-write payload encoding
//!
//! Samples are mapped to one time series each, wrapped in a `WriteRequest`,
//! serialized with prost and compressed with the Snappy block format (not
//! the framed stream format).

use super::proto::{Label, Sample, TimeSeries, WriteRequest};
use crate::{
    error::Result,
    models::{MetricKind, MetricSample},
};
use chrono::Utc;
use prost::Message;

/// Reserved label carrying the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Serializes a write request into the request body
pub trait PayloadCodec: Send + Sync {
    fn encode(&self, request: &WriteRequest) -> Result<Vec<u8>>;

    /// Value of the `Content-Encoding` header matching `encode`'s output
    fn content_encoding(&self) -> &'static str;
}

/// Protobuf serialization followed by Snappy block compression
#[derive(Debug, Clone, Copy, Default)]
pub struct SnappyProtobufCodec;

impl PayloadCodec for SnappyProtobufCodec {
    fn encode(&self, request: &WriteRequest) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(request.encoded_len());
        request.encode(&mut buf)?;
        let compressed = snap::raw::Encoder::new().compress_vec(&buf)?;
        Ok(compressed)
    }

    fn content_encoding(&self) -> &'static str {
        "snappy"
    }
}

/// Body ready for transmission
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub content_encoding: &'static str,
    /// Time series carried in the payload
    pub series: usize,
    /// Samples dropped because they had no scalar value
    pub skipped: usize,
}

impl EncodedPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub struct RemoteWriteEncoder<C: PayloadCodec = SnappyProtobufCodec> {
    codec: C,
}

impl RemoteWriteEncoder<SnappyProtobufCodec> {
    pub fn new() -> Self {
        Self::with_codec(SnappyProtobufCodec)
    }
}

impl Default for RemoteWriteEncoder<SnappyProtobufCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PayloadCodec> RemoteWriteEncoder<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Build the write request, skipping samples without a scalar value
    ///
    /// Returns the request and the number of skipped samples. Samples with
    /// no timestamp are stamped with the current time.
    pub fn build_write_request(&self, samples: &[MetricSample]) -> (WriteRequest, usize) {
        let now_ms = Utc::now().timestamp_millis();
        let mut skipped = 0;
        let mut timeseries = Vec::with_capacity(samples.len());

        for sample in samples {
            match to_time_series(sample, now_ms) {
                Some(series) => timeseries.push(series),
                None => skipped += 1,
            }
        }

        (WriteRequest { timeseries }, skipped)
    }

    pub fn encode(&self, samples: &[MetricSample]) -> Result<EncodedPayload> {
        let (request, skipped) = self.build_write_request(samples);
        let series = request.timeseries.len();
        let bytes = self.codec.encode(&request)?;

        Ok(EncodedPayload {
            bytes,
            content_encoding: self.codec.content_encoding(),
            series,
            skipped,
        })
    }
}

fn to_time_series(sample: &MetricSample, now_ms: i64) -> Option<TimeSeries> {
    if !matches!(sample.kind, MetricKind::Gauge | MetricKind::Counter | MetricKind::Untyped) {
        return None;
    }
    let value = sample.scalar()?;

    let mut labels = Vec::with_capacity(sample.labels.len() + 1);
    labels.push(Label::new(METRIC_NAME_LABEL, sample.name.as_str()));
    labels.extend(sample.labels.iter().map(|(name, value)| Label::new(name, value)));

    Some(TimeSeries {
        labels,
        samples: vec![Sample {
            value,
            timestamp: sample.timestamp_ms.unwrap_or(now_ms),
        }],
    })
}
