//! Delivery of metric samples to a Prometheus-compatible endpoint
//!
//! The primary path is remote-write: snappy-compressed protobuf posted to
//! `{base}/push`, retried with exponential backoff while the endpoint answers
//! 429. The text exposition path posts to `{base}/metrics/write` once.

pub mod encoder;
pub mod proto;
pub mod text;

pub use encoder::{EncodedPayload, PayloadCodec, RemoteWriteEncoder, SnappyProtobufCodec};

use crate::{
    error::{AppError, Result},
    logging::RemoteWriteLogger,
    models::{config::PrometheusConfig, MetricSample},
    types::RetryPolicy,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client, StatusCode};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use url::Url;

pub const REMOTE_WRITE_VERSION: &str = "0.1.0";
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const REMOTE_WRITE_VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";

/// Endpoint, credentials and retry knobs for one writer
#[derive(Debug, Clone)]
pub struct RemoteWriteConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl RemoteWriteConfig {
    pub fn from_config(config: &PrometheusConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.timeout(),
            retry: config.retry_policy(),
        }
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), suffix)
    }

    pub fn push_url(&self) -> String {
        self.endpoint("/push")
    }

    pub fn text_url(&self) -> String {
        self.endpoint("/metrics/write")
    }
}

/// Waits between rate-limited attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `Authorization` header value for HTTP Basic auth
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// HTTP client for the remote-write endpoint
pub struct RemoteWriter {
    client: Client,
    config: RemoteWriteConfig,
    encoder: RemoteWriteEncoder,
    sleeper: Arc<dyn Sleeper>,
    logger: RemoteWriteLogger,
}

impl RemoteWriter {
    pub fn new(config: RemoteWriteConfig, logger: RemoteWriteLogger) -> Result<Self> {
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            encoder: RemoteWriteEncoder::new(),
            sleeper: Arc::new(TokioSleeper),
            logger,
        })
    }

    /// Replace the backoff sleeper
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &RemoteWriteConfig {
        &self.config
    }

    /// Encode and push samples
    pub async fn write(&self, samples: &[MetricSample]) -> Result<()> {
        let payload = self.encoder.encode(samples)?;
        self.logger
            .log_encoded(payload.series, payload.skipped, payload.len())
            .await;
        self.write_encoded(&payload).await
    }

    /// Push an already encoded payload
    ///
    /// Only 429 responses are retried. Any other non-2xx status fails with the
    /// response body, and transport errors are returned as-is.
    pub async fn write_encoded(&self, payload: &EncodedPayload) -> Result<()> {
        let url = self.config.push_url();
        let auth = basic_auth_header(&self.config.username, &self.config.password);
        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            let started = Instant::now();
            let response = self
                .client
                .post(&url)
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
                .header(header::CONTENT_ENCODING, payload.content_encoding)
                .header(REMOTE_WRITE_VERSION_HEADER, REMOTE_WRITE_VERSION)
                .body(payload.bytes.clone())
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    self.logger
                        .log_http_request(&url, None, elapsed_ms(started), payload.len())
                        .await;
                    return Err(err.into());
                }
            };

            let status = response.status();
            self.logger
                .log_http_request(&url, Some(status.as_u16()), elapsed_ms(started), payload.len())
                .await;

            if status.is_success() {
                return Ok(());
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if !policy.has_next(attempt) {
                    return Err(AppError::rate_limit_exceeded(policy.max_attempts));
                }
                let wait = policy.delay_after(attempt);
                self.logger
                    .log_rate_limited(wait, attempt + 1, policy.max_attempts)
                    .await;
                self.sleeper.sleep(wait).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote_rejected(status.as_u16(), body));
        }
    }

    /// Post samples as text exposition in a single attempt
    pub async fn write_text(&self, samples: &[MetricSample]) -> Result<()> {
        let url = self.config.text_url();
        let body = text::render(samples, chrono::Utc::now().timestamp_millis());
        let size = body.len();
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(
                header::AUTHORIZATION,
                basic_auth_header(&self.config.username, &self.config.password),
            )
            .header(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        self.logger
            .log_http_request(&url, Some(status.as_u16()), elapsed_ms(started), size)
            .await;

        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::remote_rejected(status.as_u16(), body))
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
