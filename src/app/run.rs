// usbtime - app/run.rs
//
// Pipeline orchestration: read -> parse -> accumulate -> export.
//
// Single pass, single thread, fail-fast. The output file is only created
// once the table has been built, so a missing reference device or a bad
// timestamp never truncates a previous result.

use crate::core::accumulator::accumulate;
use crate::core::export::{self, render_summary};
use crate::core::parser::parse_content;
use crate::platform::config::{AppConfig, OutputFormat};
use crate::platform::fs;
use crate::util::error::{Result, UsbTimeError};
use std::path::PathBuf;

/// Per-run switches that are not part of the persistent config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Also render the plain-text per-device summary.
    pub summary: bool,
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub lines_processed: u64,
    pub lines_skipped: u64,
    pub records: usize,
    pub devices: usize,
    pub rows_written: usize,
    pub output_path: PathBuf,
    /// Present when `RunOptions::summary` was set.
    pub summary: Option<String>,
}

/// Run the whole pipeline for `config`.
pub fn run(config: &AppConfig, options: &RunOptions) -> Result<RunReport> {
    tracing::info!(
        input = %config.input_log.display(),
        output = %config.output_path.display(),
        rules = config.rules.len(),
        "Run started"
    );

    let content = fs::read_file_lossy(&config.input_log).map_err(|e| UsbTimeError::Io {
        path: config.input_log.clone(),
        operation: "read input log",
        source: e,
    })?;

    let parsed = parse_content(&content)?;
    tracing::info!(
        lines = parsed.lines_processed,
        records = parsed.records.len(),
        "Log parsed"
    );

    let state = accumulate(&parsed.records, &config.rules);
    let summary = options.summary.then(|| render_summary(&state));

    // Fails on a missing reference device before the output is touched.
    let table = export::build_table(&state)?;

    let writer = fs::create_output(&config.output_path).map_err(|e| UsbTimeError::Io {
        path: config.output_path.clone(),
        operation: "create output",
        source: e,
    })?;

    let rows_written = match config.format {
        OutputFormat::Csv => export::write_csv(&table, writer, &config.output_path)?,
        OutputFormat::Json => export::write_json(&table, writer, &config.output_path)?,
    };

    tracing::info!(
        devices = state.len(),
        rows = rows_written,
        format = ?config.format,
        output = %config.output_path.display(),
        "Run complete"
    );

    Ok(RunReport {
        lines_processed: parsed.lines_processed,
        lines_skipped: parsed.lines_skipped,
        records: parsed.records.len(),
        devices: state.len(),
        rows_written,
        output_path: config.output_path.clone(),
        summary,
    })
}
