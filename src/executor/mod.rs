//! Dual-direction probe execution
//!
//! Runs the download direction (reverse mode) and then the upload direction,
//! retrying each independently, and merges the two results into a single
//! [`CombinedMeasurement`]. Per-attempt failures are absorbed here; only the
//! case where neither direction produced throughput reaches the caller.

use crate::{
    error::{AppError, Result},
    logging::ProbeLogger,
    models::{CombinedMeasurement, DirectionalProbeResult},
    probe::{parse_report, ProbeRunner},
    types::{Direction, RetryPolicy},
};

pub use crate::probe::ProbeTarget;

/// Drives one probe cycle in both directions
pub struct DualDirectionOrchestrator<R: ProbeRunner> {
    runner: R,
    retry: RetryPolicy,
    logger: ProbeLogger,
}

impl<R: ProbeRunner> DualDirectionOrchestrator<R> {
    pub fn new(runner: R, retry: RetryPolicy, logger: ProbeLogger) -> Self {
        Self { runner, retry, logger }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run download then upload and merge the outcome
    ///
    /// A failed download does not stop the upload run. The cycle fails with
    /// [`AppError::BothDirectionsFailed`] only when upload also fails and
    /// download contributed no throughput.
    pub async fn run(&self, target: &ProbeTarget) -> Result<CombinedMeasurement> {
        let download = self.run_direction(target, Direction::Download).await;
        let download = match download {
            Ok(result) => Some(result),
            Err(err) => {
                self.logger
                    .log_direction_failed(Direction::Download, self.retry.max_attempts, &err)
                    .await;
                None
            }
        };

        let upload = match self.run_direction(target, Direction::Upload).await {
            Ok(result) => Some(result),
            Err(err) => {
                self.logger
                    .log_direction_failed(Direction::Upload, self.retry.max_attempts, &err)
                    .await;
                let download_mbps = download.map_or(0.0, |d| d.throughput_mbps);
                if download_mbps == 0.0 {
                    return Err(AppError::both_directions_failed(format!(
                        "both download and upload tests failed against {}: {}",
                        target, err
                    )));
                }
                None
            }
        };

        let measurement = CombinedMeasurement::merge(download.as_ref(), upload.as_ref());
        self.logger.log_measurement(&measurement).await;
        Ok(measurement)
    }

    /// Attempt one direction until it succeeds or the policy is exhausted
    ///
    /// Attempts are sequential with no delay between them. Returns the error
    /// of the last attempt.
    pub async fn run_direction(&self, target: &ProbeTarget, direction: Direction) -> Result<DirectionalProbeResult> {
        let request = target.request(direction);
        let target_label = target.to_string();
        let mut attempt = 0;

        loop {
            self.logger
                .log_attempt_start(direction, &target_label, attempt + 1, self.retry.max_attempts)
                .await;

            let outcome = match self.runner.run(&request).await {
                Ok(raw) => parse_report(&raw, direction),
                Err(err) => Err(err),
            };

            match outcome {
                Ok(result) => {
                    self.logger
                        .log_direction_result(direction, result.throughput_mbps, result.latency_ms, result.jitter_ms)
                        .await;
                    return Ok(result);
                }
                Err(err) if self.retry.has_next(attempt) => {
                    self.logger.log_retry(direction, attempt + 1, &err).await;
                    let delay = self.retry.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Logger;
    use crate::probe::report::fixtures::report;
    use crate::probe::ProbeRequest;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Script = VecDeque<Result<String>>;

    /// Replays scripted outputs per direction and records every call
    #[derive(Default)]
    struct ScriptedRunner {
        download: Mutex<Script>,
        upload: Mutex<Script>,
        calls: Mutex<Vec<Direction>>,
    }

    impl ScriptedRunner {
        fn new(download: Vec<Result<String>>, upload: Vec<Result<String>>) -> Self {
            Self {
                download: Mutex::new(download.into()),
                upload: Mutex::new(upload.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls_for(&self, direction: Direction) -> usize {
            self.calls.lock().unwrap().iter().filter(|d| **d == direction).count()
        }
    }

    #[async_trait]
    impl ProbeRunner for ScriptedRunner {
        async fn run(&self, request: &ProbeRequest) -> Result<String> {
            self.calls.lock().unwrap().push(request.direction);
            let script = match request.direction {
                Direction::Download => &self.download,
                Direction::Upload => &self.upload,
            };
            script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::probe_execution("connection refused")))
        }
    }

    fn failure() -> Result<String> {
        Err(AppError::probe_execution("iperf3 command failed: exit status: 1"))
    }

    fn orchestrator(runner: ScriptedRunner) -> DualDirectionOrchestrator<ScriptedRunner> {
        let logger = ProbeLogger::from_logger(Logger::quiet("PROBE"));
        DualDirectionOrchestrator::new(runner, RetryPolicy::immediate(2), logger)
    }

    fn target() -> ProbeTarget {
        ProbeTarget::new("iperf.example.net", 5201, 10)
    }

    #[tokio::test]
    async fn test_both_directions_succeed() {
        let runner = ScriptedRunner::new(
            vec![Ok(report(0.0, 90e6, 85.5e6, Some(48_000.0), Some(2_100.0)))],
            vec![Ok(report(0.0, 42.3e6, 40e6, Some(45_230.0), Some(3_400.0)))],
        );
        let orchestrator = orchestrator(runner);

        let measurement = orchestrator.run(&target()).await.unwrap();
        assert!((measurement.download_mbps - 85.5).abs() < 1e-9);
        assert!((measurement.upload_mbps - 42.3).abs() < 1e-9);
        assert!((measurement.latency_ms - 45.23).abs() < 1e-9);
        assert!((measurement.jitter_ms - 2.1).abs() < 1e-9);
        assert_eq!(measurement.packet_loss_percent(), 0.0);
        assert_eq!(orchestrator.runner().calls_for(Direction::Download), 1);
        assert_eq!(orchestrator.runner().calls_for(Direction::Upload), 1);
    }

    #[tokio::test]
    async fn test_download_runs_before_upload() {
        let runner = ScriptedRunner::new(
            vec![Ok(report(0.0, 1e6, 1e6, None, None))],
            vec![Ok(report(0.0, 1e6, 1e6, None, None))],
        );
        let orchestrator = orchestrator(runner);
        orchestrator.run(&target()).await.unwrap();

        let calls = orchestrator.runner().calls.lock().unwrap().clone();
        assert_eq!(calls, vec![Direction::Download, Direction::Upload]);
    }

    #[tokio::test]
    async fn test_retry_after_single_failure() {
        let runner = ScriptedRunner::new(
            vec![failure(), Ok(report(0.0, 0.0, 50e6, None, None))],
            vec![Ok(report(0.0, 20e6, 0.0, None, None))],
        );
        let orchestrator = orchestrator(runner);

        let measurement = orchestrator.run(&target()).await.unwrap();
        assert!((measurement.download_mbps - 50.0).abs() < 1e-9);
        assert_eq!(orchestrator.runner().calls_for(Direction::Download), 2);
        assert_eq!(orchestrator.runner().calls_for(Direction::Upload), 1);
    }

    #[tokio::test]
    async fn test_malformed_output_is_retried() {
        let runner = ScriptedRunner::new(
            vec![Ok("not json".to_string()), Ok(report(0.0, 0.0, 30e6, None, None))],
            vec![Ok(report(0.0, 10e6, 0.0, None, None))],
        );
        let orchestrator = orchestrator(runner);

        let measurement = orchestrator.run(&target()).await.unwrap();
        assert!((measurement.download_mbps - 30.0).abs() < 1e-9);
        assert_eq!(orchestrator.runner().calls_for(Direction::Download), 2);
    }

    #[tokio::test]
    async fn test_download_failure_keeps_upload() {
        let runner = ScriptedRunner::new(
            vec![failure(), failure()],
            vec![Ok(report(0.0, 10e6, 9e6, Some(20_000.0), Some(1_000.0)))],
        );
        let orchestrator = orchestrator(runner);

        let measurement = orchestrator.run(&target()).await.unwrap();
        assert_eq!(measurement.download_mbps, 0.0);
        assert!((measurement.upload_mbps - 10.0).abs() < 1e-9);
        assert!((measurement.latency_ms - 20.0).abs() < 1e-9);
        assert_eq!(orchestrator.runner().calls_for(Direction::Download), 2);
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_download() {
        let runner = ScriptedRunner::new(
            vec![Ok(report(0.0, 0.0, 85.5e6, None, None))],
            vec![failure(), failure()],
        );
        let orchestrator = orchestrator(runner);

        let measurement = orchestrator.run(&target()).await.unwrap();
        assert!((measurement.download_mbps - 85.5).abs() < 1e-9);
        assert_eq!(measurement.upload_mbps, 0.0);
        assert!(measurement.is_reportable());
    }

    #[tokio::test]
    async fn test_both_directions_failed() {
        let runner = ScriptedRunner::new(vec![failure(), failure()], vec![failure(), failure()]);
        let orchestrator = orchestrator(runner);

        let err = orchestrator.run(&target()).await.unwrap_err();
        assert!(matches!(err, AppError::BothDirectionsFailed(_)));
        assert_eq!(orchestrator.runner().calls_for(Direction::Download), 2);
        assert_eq!(orchestrator.runner().calls_for(Direction::Upload), 2);
    }

    #[tokio::test]
    async fn test_zero_download_and_failed_upload_is_fatal() {
        let runner = ScriptedRunner::new(
            vec![Ok(report(0.0, 0.0, 0.0, Some(10_000.0), None))],
            vec![failure(), failure()],
        );
        let orchestrator = orchestrator(runner);

        let err = orchestrator.run(&target()).await.unwrap_err();
        assert_eq!(err.category(), "PROBE");
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn test_retry_ceiling_is_configurable() {
        let runner = ScriptedRunner::new(vec![failure(), failure(), failure()], vec![failure()]);
        let logger = ProbeLogger::from_logger(Logger::quiet("PROBE"));
        let orchestrator = DualDirectionOrchestrator::new(runner, RetryPolicy::immediate(1), logger);

        assert!(orchestrator.run(&target()).await.is_err());
        assert_eq!(orchestrator.runner().calls_for(Direction::Download), 1);
        assert_eq!(orchestrator.runner().calls_for(Direction::Upload), 1);
    }
}
