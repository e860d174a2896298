//! CLI behaviour tests
//!
//! Runs the compiled binary against temporary configuration files. Probe runs
//! use a shell script standing in for iperf3, so the run tests are unix-only.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const IBENC_VARS: [&str; 9] = [
    "IBENC_PROMETHEUS_URL",
    "IBENC_PROMETHEUS_USER",
    "IBENC_PROMETHEUS_PASS",
    "IBENC_SERVER",
    "IBENC_PORT",
    "IBENC_DURATION",
    "IBENC_LOCATION",
    "IBENC_ISP_NAME",
    "IBENC_PACKAGE_NAME",
];

/// Command isolated from the caller's environment and working directory
fn create_test_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ibenc").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1");
    for var in IBENC_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, url: &str, binary: &str) -> PathBuf {
    let path = dir.join("ibenc.yaml");
    let content = format!(
        r#"prometheus:
  url: {url}
  username: "123456"
  password: glc_token
iperf3:
  server: 127.0.0.1
  duration: 1
  binary: {binary}
metrics:
  location: fra
  isp_name: acme
  package_name: pro
"#
    );
    fs::write(&path, content).unwrap();
    path
}

#[cfg(unix)]
fn fake_iperf3(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-iperf3.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
const REPORT: &str = r#"{"end":{"streams":[{"sender":{"rtt":45230,"rttvar":2100}}],"sum_sent":{"bits_per_second":42300000},"sum_received":{"bits_per_second":85500000}}}"#;

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("send-test"))
        .stdout(predicate::str::contains("debug-metric"))
        .stdout(predicate::str::contains("env-help"))
        .stdout(predicate::str::contains("init-config"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_version_includes_build_info() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("target:"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--config", "does-not-exist.yaml", "run", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_incomplete_config_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ibenc.yaml");
    fs::write(&path, "prometheus:\n  url: https://prometheus.example.net\n").unwrap();

    create_test_cmd(dir.path())
        .args(["run", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("prometheus.username is required"));
}

#[test]
fn test_env_help_works_without_config() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .env("IBENC_PORT", "99999")
        .arg("env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("IBENC_PROMETHEUS_URL"))
        .stdout(predicate::str::contains("Configuration Priority"))
        .stderr(predicate::str::contains("Warning: Configuration error: IBENC_PORT"));
}

#[test]
fn test_init_config_then_refuse_overwrite() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .arg("init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote example configuration"));
    let content = fs::read_to_string(dir.path().join("ibenc.yaml")).unwrap();
    assert!(content.contains("iperf3:"));

    create_test_cmd(dir.path())
        .arg("init-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    create_test_cmd(dir.path())
        .args(["init-config", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_errors_carry_suggestion() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--config", "missing.yaml", "send-test"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Suggestion:"));
}

#[test]
fn test_invalid_port_rejected_by_parser() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(dir.path())
        .args(["--port", "70000", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("70000"));
}

#[cfg(unix)]
#[test]
fn test_dry_run_prints_measurement_and_samples() {
    let dir = TempDir::new().unwrap();
    let script = fake_iperf3(dir.path(), &format!("echo '{}'", REPORT));
    write_config(dir.path(), "http://127.0.0.1:9/api/prom", script.to_str().unwrap());

    create_test_cmd(dir.path())
        .args(["--no-color", "run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Download:    85.50 Mbps"))
        .stdout(predicate::str::contains("Upload:      42.30 Mbps"))
        .stdout(predicate::str::contains("Latency:     45.23 ms"))
        .stdout(predicate::str::contains("Samples (5)"))
        .stdout(predicate::str::contains("ibenc_download_speed_mbps{location=\"fra\",isp_name=\"acme\",package_name=\"pro\"} 85.5"));
}

#[cfg(unix)]
#[test]
fn test_env_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let script = fake_iperf3(dir.path(), &format!("echo '{}'", REPORT));
    write_config(dir.path(), "http://127.0.0.1:9/api/prom", script.to_str().unwrap());

    create_test_cmd(dir.path())
        .env("IBENC_LOCATION", "ams")
        .args(["run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("location=\"ams\""));
}

#[cfg(unix)]
#[test]
fn test_probe_failure_exits_with_probe_code() {
    let dir = TempDir::new().unwrap();
    let script = fake_iperf3(dir.path(), "echo 'iperf3: error - unable to connect to server' >&2\nexit 1");
    write_config(dir.path(), "http://127.0.0.1:9/api/prom", script.to_str().unwrap());

    create_test_cmd(dir.path())
        .args(["run"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("unable to connect"));
}

#[cfg(unix)]
#[test]
fn test_zero_throughput_is_not_sent() {
    let dir = TempDir::new().unwrap();
    let script = fake_iperf3(dir.path(), r#"echo '{"end":{"sum":{"bits_per_second":0}}}'"#);
    // Nothing listens on port 9, so a send attempt would fail with a transport error
    write_config(dir.path(), "http://127.0.0.1:9/api/prom", script.to_str().unwrap());

    create_test_cmd(dir.path())
        .args(["run"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("no usable result"));
}
