// usbtime - tests/e2e_pipeline.rs
//
// End-to-end tests for the parse -> accumulate -> export pipeline.
//
// These tests exercise the real filesystem, real config loading and the
// real binary. No mocks: a kernel log fixture on disk goes in, a CSV (or
// JSON) file on disk comes out.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use usbtime::app::run::{run, RunOptions};
use usbtime::platform::config::{load_config, AppConfig, OutputFormat};
use usbtime::util::error::{ExportError, UsbTimeError};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Fixture rules, with input pointed at `input` and output into `out_dir`.
fn fixture_config(input: &Path, out_dir: &Path, file_name: &str) -> AppConfig {
    let (mut config, warnings) = load_config(Some(&fixture("rules.toml"))).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    config.input_log = input.to_path_buf();
    config.output_path = out_dir.join(file_name);
    config
}

const EXPECTED_FIXTURE_CSV: &str = "\
\"usb\",\"Reset\",\"Enumeration\",\"Suspend\"\r\n\
\"usb1\",\"0\",\"0\",\"3.0\"\r\n\
\"usb1-1\",\"0.25\",\"0.5\",\"0\"\r\n\
\"usb1-2\",\"-2.5\",\"0\",\"0\"\r\n\
\"usb2-1.3\",\"0.5\",\"0\",\"0\"\r\n";

// =============================================================================
// Library pipeline
// =============================================================================

/// The sample dmesg produces one sorted row per device with every category.
#[test]
fn e2e_fixture_log_to_csv() {
    let out = tempfile::tempdir().unwrap();
    let config = fixture_config(&fixture("dmesg_usb_sample.log"), out.path(), "timing.csv");

    let report = run(&config, &RunOptions::default()).unwrap();

    assert_eq!(report.lines_processed, 13);
    assert_eq!(report.records, 9);
    assert_eq!(report.lines_skipped, 4);
    assert_eq!(report.devices, 4);
    assert_eq!(report.rows_written, 4);

    let csv = fs::read_to_string(&config.output_path).unwrap();
    assert_eq!(csv, EXPECTED_FIXTURE_CSV);
}

/// Minimal begin/end pair with a single rule.
#[test]
fn e2e_single_reset_interval() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("kernel.log");
    fs::write(
        &log,
        "[  1.000] usb 1-1: usb reset begin\n[  2.500] usb 1-1: usb reset end\n",
    )
    .unwrap();
    let rules = dir.path().join("config.toml");
    fs::write(
        &rules,
        "[[rules]]\nkeyword = \"reset\"\ncategory = \"Reset\"\n",
    )
    .unwrap();

    let (mut config, _) = load_config(Some(&rules)).unwrap();
    config.input_log = log;
    config.output_path = dir.path().join("out.csv");

    run(&config, &RunOptions::default()).unwrap();

    assert_eq!(
        fs::read_to_string(&config.output_path).unwrap(),
        "\"usb\",\"Reset\"\r\n\"usb1-1\",\"1.5\"\r\n"
    );
}

/// JSON output carries the same rows in the same order.
#[test]
fn e2e_fixture_log_to_json() {
    let out = tempfile::tempdir().unwrap();
    let mut config = fixture_config(&fixture("dmesg_usb_sample.log"), out.path(), "timing.json");
    config.format = OutputFormat::Json;

    let report = run(&config, &RunOptions::default()).unwrap();
    assert_eq!(report.rows_written, 4);

    let text = fs::read_to_string(&config.output_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let devices: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["device"].as_str().unwrap())
        .collect();
    assert_eq!(devices, vec!["usb1", "usb1-1", "usb1-2", "usb2-1.3"]);
    assert_eq!(value[1]["durations"]["Enumeration"], 0.5);
    assert_eq!(value[2]["durations"]["Reset"], -2.5);
}

/// Without device 1-1 the run fails and writes nothing.
#[test]
fn e2e_missing_reference_device_fails() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("kernel.log");
    fs::write(
        &log,
        "[  1.000] usb 1-2: usb reset begin\n[  2.000] usb 1-2: usb reset end\n",
    )
    .unwrap();
    let config = fixture_config(&log, dir.path(), "out.csv");

    let err = run(&config, &RunOptions::default()).unwrap_err();
    assert!(
        matches!(
            err,
            UsbTimeError::Export(ExportError::MissingReferenceDevice { .. })
        ),
        "expected MissingReferenceDevice, got {err:?}"
    );
    assert!(!config.output_path.exists());
}

/// The summary lists every device and category.
#[test]
fn e2e_summary_lists_devices() {
    let out = tempfile::tempdir().unwrap();
    let config = fixture_config(&fixture("dmesg_usb_sample.log"), out.path(), "timing.csv");

    let report = run(&config, &RunOptions { summary: true }).unwrap();
    let summary = report.summary.unwrap();

    assert!(summary.contains("\t 1-1 Reset 0.25\n"), "{summary}");
    assert!(summary.contains("\t usb1 Suspend 3.0\n"), "{summary}");
    assert!(summary.lines().any(|l| l == "2-1.3"), "{summary}");
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn e2e_cli_writes_output_and_summary() {
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("cli.csv");

    Command::cargo_bin("usbtime")
        .unwrap()
        .arg("--config")
        .arg(fixture("rules.toml"))
        .arg("--input")
        .arg(fixture("dmesg_usb_sample.log"))
        .arg("--output")
        .arg(&output)
        .arg("--summary")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("\t 1-2 Reset -2.5"));

    assert_eq!(fs::read_to_string(&output).unwrap(), EXPECTED_FIXTURE_CSV);
}

#[test]
fn e2e_cli_missing_reference_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("kernel.log");
    fs::write(&log, "[  1.000] usb 3-1: usb reset begin\n").unwrap();

    Command::cargo_bin("usbtime")
        .unwrap()
        .arg("--config")
        .arg(fixture("rules.toml"))
        .arg("--input")
        .arg(&log)
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reference device '1-1'"));
}

#[test]
fn e2e_cli_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("usbtime")
        .unwrap()
        .arg("--config")
        .arg(fixture("rules.toml"))
        .arg("--input")
        .arg(fixture("dmesg_usb_sample.log"))
        .arg("--output")
        .arg(dir.path().join("out.xml"))
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not recognised"));
}
