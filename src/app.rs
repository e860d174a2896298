//! Main application orchestration and execution

use crate::{
    cli::{Cli, Command, InitConfigArgs, RunArgs},
    config::{display_config_summary, load_config, validate_config, EnvManager},
    error::{AppError, Result},
    executor::DualDirectionOrchestrator,
    logging::{Logger, LoggerFactory},
    metrics::MetricProjection,
    models::{CombinedMeasurement, Config, MetricSample},
    output::MeasurementFormatter,
    probe::{Iperf3Runner, ProbeRunner, ProbeTarget},
    remote::{RemoteWriteConfig, RemoteWriter},
};

/// What one benchmark cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub measurement: CombinedMeasurement,
    pub samples: Vec<MetricSample>,
    /// False for dry runs
    pub sent: bool,
}

/// Probe target described by the configuration
pub fn probe_target(config: &Config) -> Result<ProbeTarget> {
    let port = u16::try_from(config.iperf3.port)
        .map_err(|_| AppError::config(format!("iperf3.port out of range: {}", config.iperf3.port)))?;
    Ok(ProbeTarget::new(config.iperf3.server.clone(), port, config.iperf3.duration))
}

/// Run both probe directions, then project and deliver the measurement
///
/// An all-zero measurement is never sent; it fails with
/// [`AppError::BothDirectionsFailed`] so the caller exits non-zero.
pub async fn run_cycle<R: ProbeRunner>(
    config: &Config,
    runner: R,
    options: &RunArgs,
    factory: &LoggerFactory,
) -> Result<CycleReport> {
    let target = probe_target(config)?;
    let errors = factory.create_error_logger().await;
    let session = factory.session_id().to_string();

    let orchestrator = DualDirectionOrchestrator::new(
        runner,
        config.iperf3.retry_policy(),
        factory.create_probe_logger().await,
    );

    let measurement = match orchestrator.run(&target).await {
        Ok(measurement) => measurement,
        Err(err) => {
            errors.log_error(&err, Some("probe"), Some(&session)).await;
            return Err(err);
        }
    };

    if !measurement.is_reportable() {
        errors.log_no_usable_result(Some(&session)).await;
        return Err(AppError::both_directions_failed(
            "no usable result: download and upload throughput are both zero",
        ));
    }

    let projection = MetricProjection::new(config.metrics.namespace.clone());
    let samples = projection.project_now(&measurement, &config.label_set());

    if options.dry_run {
        return Ok(CycleReport {
            measurement,
            samples,
            sent: false,
        });
    }

    let writer = RemoteWriter::new(
        RemoteWriteConfig::from_config(&config.prometheus),
        factory.create_remote_logger().await,
    )?;
    let sent = if options.text {
        writer.write_text(&samples).await
    } else {
        writer.write(&samples).await
    };
    if let Err(err) = sent {
        errors.log_error(&err, Some("remote write"), Some(&session)).await;
        return Err(err);
    }

    Ok(CycleReport {
        measurement,
        samples,
        sent: true,
    })
}

/// Run the command selected on the command line
///
/// `env-help` and `init-config` work without a loadable configuration file.
pub async fn launch(cli: Cli) -> Result<()> {
    match cli.action() {
        Command::EnvHelp => {
            print_env_help();
            Ok(())
        }
        Command::InitConfig(args) => init_config(&cli, &args),
        _ => App::new(cli).await?.run().await,
    }
}

fn print_env_help() {
    println!("{}", EnvManager::display_env_help());
    for warning in EnvManager::validate_current_env() {
        eprintln!("{}", warning);
    }
}

/// Write the example configuration to the `--config` path
pub fn init_config(cli: &Cli, args: &InitConfigArgs) -> Result<()> {
    let path = crate::config::parser::expand_tilde(cli.config_path());
    EnvManager::save_example_config_file(&path, args.force)?;
    println!("Wrote example configuration to {}", path.display());
    println!("Edit the prometheus, iperf3 and metrics sections, then run `ibenc run --dry-run`.");
    Ok(())
}

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
    config: Config,
    factory: LoggerFactory,
    logger: Logger,
    formatter: MeasurementFormatter,
}

impl App {
    /// Load configuration and set up logging
    pub async fn new(cli: Cli) -> Result<Self> {
        let config = load_config(cli.clone())?;
        let factory = LoggerFactory::new(config.output.clone());
        let logger = factory.create_logger("APP").await;
        let formatter = MeasurementFormatter::new(config.output.enable_color && cli.use_colors());

        Ok(Self {
            cli,
            config,
            factory,
            logger,
            formatter,
        })
    }

    /// Run the selected command
    pub async fn run(self) -> Result<()> {
        let warnings = validate_config(&self.config)?;
        for warning in &warnings {
            eprintln!("{}", warning.format(self.config.output.enable_color));
        }

        if self.config.output.debug {
            println!(
                "{} v{} ({}@{})",
                crate::PKG_NAME,
                crate::VERSION,
                option_env!("GIT_BRANCH").unwrap_or("unknown"),
                option_env!("GIT_COMMIT").unwrap_or("unknown")
            );
            println!("{}", display_config_summary(&self.config));
            println!();
        }

        match self.cli.action() {
            Command::Run(options) => self.run_benchmark(&options).await,
            Command::SendTest => self.send_test().await,
            Command::DebugMetric => self.debug_metric().await,
            Command::EnvHelp => {
                print_env_help();
                Ok(())
            }
            Command::InitConfig(args) => init_config(&self.cli, &args),
        }
    }

    async fn run_benchmark(&self, options: &RunArgs) -> Result<()> {
        let runner = Iperf3Runner::new(self.config.iperf3.binary.clone());
        crate::log_info!(
            self.logger,
            "Starting bandwidth test against {}:{} ({}s per direction)",
            self.config.iperf3.server,
            self.config.iperf3.port,
            self.config.iperf3.duration
        );

        let target = probe_target(&self.config)?;
        let report = run_cycle(&self.config, runner, options, &self.factory).await?;

        println!("{}", self.formatter.format_measurement(&report.measurement, &target.to_string()));
        if report.sent {
            println!("{}", self.formatter.format_sent(report.samples.len(), &self.endpoint(options.text)));
        } else {
            println!();
            println!("{}", self.formatter.format_samples(&report.samples));
        }
        Ok(())
    }

    async fn send_test(&self) -> Result<()> {
        let projection = MetricProjection::new(self.config.metrics.namespace.clone());
        let samples = projection.test_samples(&self.config.label_set());
        crate::log_debug!(self.logger, "Sending {} test samples", samples.len());

        self.writer().await?.write(&samples).await?;
        println!("{}", self.formatter.format_sent(samples.len(), &self.endpoint(false)));
        Ok(())
    }

    async fn debug_metric(&self) -> Result<()> {
        let projection = MetricProjection::new(self.config.metrics.namespace.clone());
        let samples: Vec<MetricSample> = projection
            .test_samples(&self.config.label_set())
            .into_iter()
            .take(1)
            .collect();

        for sample in &samples {
            println!("{}", self.formatter.format_sample_detail(sample));
        }

        self.writer().await?.write(&samples).await?;
        println!("{}", self.formatter.format_sent(samples.len(), &self.endpoint(false)));
        Ok(())
    }

    async fn writer(&self) -> Result<RemoteWriter> {
        RemoteWriter::new(
            RemoteWriteConfig::from_config(&self.config.prometheus),
            self.factory.create_remote_logger().await,
        )
    }

    fn endpoint(&self, text: bool) -> String {
        let config = RemoteWriteConfig::from_config(&self.config.prometheus);
        if text {
            config.text_url()
        } else {
            config.push_url()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::sample_config;
    use crate::models::config::OutputConfig;
    use crate::probe::{report::fixtures::report, ProbeRequest};
    use crate::types::Direction;
    use async_trait::async_trait;
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    /// Returns the same report for both directions, or always fails
    struct FixedRunner {
        download: Option<String>,
        upload: Option<String>,
    }

    #[async_trait]
    impl ProbeRunner for FixedRunner {
        async fn run(&self, request: &ProbeRequest) -> Result<String> {
            let output = match request.direction {
                Direction::Download => &self.download,
                Direction::Upload => &self.upload,
            };
            output
                .clone()
                .ok_or_else(|| AppError::probe_execution("iperf3 command failed"))
        }
    }

    fn quiet_factory() -> LoggerFactory {
        LoggerFactory::new(OutputConfig::default())
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = sample_config();
        config.prometheus.url = server.uri();
        config
    }

    #[tokio::test]
    async fn test_cycle_sends_measurement() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let runner = FixedRunner {
            download: Some(report(0.0, 0.0, 85.5e6, Some(48_000.0), Some(2_100.0))),
            upload: Some(report(0.0, 42.3e6, 0.0, Some(45_230.0), Some(3_000.0))),
        };
        let report = run_cycle(&config_for(&server), runner, &RunArgs::default(), &quiet_factory())
            .await
            .unwrap();

        assert!(report.sent);
        assert_eq!(report.samples.len(), 5);
        assert_eq!(report.samples[0].name, "ibenc_download_speed_mbps");
    }

    #[tokio::test]
    async fn test_failed_probes_send_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let runner = FixedRunner { download: None, upload: None };
        let err = run_cycle(&config_for(&server), runner, &RunArgs::default(), &quiet_factory())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BothDirectionsFailed(_)));
    }

    #[tokio::test]
    async fn test_all_zero_measurement_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let runner = FixedRunner {
            download: None,
            upload: Some(report(0.0, 0.0, 0.0, Some(20_000.0), None)),
        };
        let err = run_cycle(&config_for(&server), runner, &RunArgs::default(), &quiet_factory())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn test_dry_run_skips_network() {
        let runner = FixedRunner {
            download: Some(report(0.0, 0.0, 10e6, None, None)),
            upload: None,
        };
        let options = RunArgs { text: false, dry_run: true };
        let report = run_cycle(&sample_config(), runner, &options, &quiet_factory()).await.unwrap();

        assert!(!report.sent);
        assert_eq!(report.measurement.upload_mbps, 0.0);
        assert_eq!(report.samples.len(), 5);
    }

    #[test]
    fn test_init_config_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ibenc.yaml");
        let cli = <Cli as clap::Parser>::try_parse_from([
            "ibenc",
            "--config",
            path.to_str().unwrap(),
            "init-config",
        ])
        .unwrap();
        assert_eq!(cli.action(), Command::InitConfig(InitConfigArgs::default()));

        init_config(&cli, &InitConfigArgs::default()).unwrap();
        let config = crate::config::parser::load_config_file(&path).unwrap();
        assert!(config.validate().is_ok());

        let err = init_config(&cli, &InitConfigArgs::default()).unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        init_config(&cli, &InitConfigArgs { force: true }).unwrap();
    }

    #[test]
    fn test_probe_target_from_config() {
        let target = probe_target(&sample_config()).unwrap();
        assert_eq!(target.to_string(), "iperf.example.net:5201");
        assert_eq!(target.duration_secs, 10);
    }
}
