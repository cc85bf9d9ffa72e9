// usbtime - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading (built-in defaults + optional config.toml)
// 3. Logging initialisation (debug mode support)
// 4. Running the pipeline and reporting the outcome

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use usbtime::app::run::{self, RunOptions};
use usbtime::platform::config::{self, OutputFormat};
use usbtime::util;

/// usbtime - USB kernel log timing analyser.
///
/// Reads a kernel log, pairs `begin` and `end`/`down` USB messages per device
/// and category, and writes the durations as a table. With no arguments the
/// paths and rules come from the configuration.
#[derive(Parser, Debug)]
#[command(name = "usbtime", version, about)]
struct Cli {
    /// Config file (defaults to config.toml in the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Kernel log to read, overriding [paths] input_log.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Output file, overriding [paths] output_csv.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output format: csv or json, overriding [output] format.
    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    /// Print a per-device summary to stdout.
    #[arg(short = 's', long = "summary")]
    summary: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config comes first so that [logging] level can take effect.
    let loaded = config::load_config(cli.config.as_deref());
    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|(c, _)| c.log_level.clone());
    util::logging::init(cli.debug, config_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "usbtime starting"
    );

    let (mut app_config, warnings) = match loaded {
        Ok(v) => v,
        Err(e) => return fail(&e.into()),
    };
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    if let Some(input) = cli.input {
        app_config.input_log = input;
    }
    if let Some(output) = cli.output {
        app_config.output_path = output;
    }
    if let Some(ref format) = cli.format {
        match format.parse::<OutputFormat>() {
            Ok(f) => app_config.format = f,
            Err(e) => return fail(&e.into()),
        }
    }

    let options = RunOptions {
        summary: cli.summary,
    };

    match run::run(&app_config, &options) {
        Ok(report) => {
            if let Some(summary) = report.summary {
                print!("{summary}");
            }
            tracing::info!(
                lines = report.lines_processed,
                skipped = report.lines_skipped,
                devices = report.devices,
                rows = report.rows_written,
                output = %report.output_path.display(),
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(e: &util::error::UsbTimeError) -> ExitCode {
    tracing::error!(error = %e, "usbtime failed");
    eprintln!("Error: {e}");
    ExitCode::FAILURE
}
