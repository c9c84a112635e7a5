//! CLI — argument model and command dispatch for `startstop-inspect`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};

use super::boot::load_config;
use crate::archive::archive_log;
use crate::diag::TracingSink;
use crate::error::InspectError;
use crate::record::{append_record, MeasurementRecord};
use crate::scan::{scan_errors, ScanContext};
use crate::threshold::{evaluate, MeasurementSet, Mode};
use crate::timing::{extract_durations, DurationPair};

#[derive(Debug, Parser)]
#[command(name = "startstop-inspect", version, about = "Inspect captured application logs and measurements")]
pub struct Cli {
    /// Configuration file (defaults to $INSPECT_CONFIG_FILE or ./startstop-inspect.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the started/stopped durations found in a log
    Timings { log: PathBuf },

    /// Fail if the log has ERROR lines not covered by the app's allow-list
    Errors {
        log: PathBuf,
        #[arg(long)]
        app: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        method: String,
        #[arg(long)]
        mode: Mode,
        /// Archive the log before scanning
        #[arg(long)]
        archive: bool,
    },

    /// Compare measurements with the app's thresholds
    Thresholds {
        #[arg(long)]
        app: String,
        #[arg(long)]
        mode: Mode,
        #[arg(long)]
        rss_kb: Option<u64>,
        #[arg(long)]
        first_request_ms: Option<u64>,
        #[arg(long)]
        reload_ms: Option<u64>,
    },

    /// Copy a log into testsuite/target/archived-logs/<class>/<method>
    Archive {
        log: PathBuf,
        #[arg(long)]
        class: String,
        #[arg(long)]
        method: String,
    },

    /// Append a measurement row to the results file
    Record {
        #[arg(long = "column", value_name = "NAME=VALUE", value_parser = MeasurementRecord::parse_column, required = true)]
        columns: Vec<(String, String)>,
        /// Results file (defaults to measurements_file from the configuration)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Passed => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// Run one command. Check failures (error lines, exceeded thresholds) become
/// [`Outcome::Failed`]; setup problems are returned as errors.
pub fn run(cli: Cli) -> Result<Outcome> {
    let sink = TracingSink;
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Timings { log } => {
            let pair = extract_durations(&log, &sink)?;
            print_timings(&pair, cli.json)?;
            Ok(Outcome::Passed)
        }

        Command::Errors { log, app, class, method, mode, archive } => {
            let config = load_config(config_path)?;
            let profile = config.app(&app)?;
            if archive {
                archive_log(&config.base_dir(), &class, &method, &log, &sink)
                    .with_context(|| format!("archiving {}", log.display()))?;
            }
            let ctx = ScanContext::new(class, method, app, mode);
            let report = scan_errors(&log, &profile.allow_list(), &ctx, &sink)?;
            if cli.json {
                print_json(&report)?;
            }
            check_outcome(report.ensure_clean(&ctx, &log).map(|_| ()))
        }

        Command::Thresholds { app, mode, rss_kb, first_request_ms, reload_ms } => {
            let config = load_config(config_path)?;
            let table = config.app(&app)?.threshold_table(&config)?;
            let measurements = MeasurementSet {
                time_to_first_ok_request_ms: first_request_ms,
                rss_kb,
                time_to_reload_ms: reload_ms,
            };
            if measurements == MeasurementSet::default() {
                warn!("No measurements given; nothing to evaluate");
            }
            let evaluation = evaluate(&measurements, mode, config.platform()?, &table, &app)?;
            if cli.json {
                print_json(&evaluation)?;
            } else {
                for v in &evaluation.verdicts {
                    println!(
                        "{}: {} {} (threshold {}) {}",
                        v.metric,
                        v.measured,
                        v.metric.unit(),
                        v.threshold,
                        if v.passed { "ok" } else { "FAILED" }
                    );
                }
            }
            check_outcome(evaluation.ensure_passed().map(|_| ()))
        }

        Command::Archive { log, class, method } => {
            let config = load_config(config_path)?;
            match archive_log(&config.base_dir(), &class, &method, &log, &sink)? {
                Some(dest) => println!("{}", dest.display()),
                None => return Ok(Outcome::Failed),
            }
            Ok(Outcome::Passed)
        }

        Command::Record { columns, file } => {
            let path = match file {
                Some(f) => f,
                None => load_config(config_path)?.measurements_path(),
            };
            let record: MeasurementRecord = columns.into_iter().collect();
            append_record(&record, &path, &sink)
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(Outcome::Passed)
        }
    }
}

fn check_outcome(result: std::result::Result<(), InspectError>) -> Result<Outcome> {
    match result {
        Ok(()) => Ok(Outcome::Passed),
        Err(e) if e.is_check_failure() => {
            error!("{}", e);
            eprintln!("{}", e);
            Ok(Outcome::Failed)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_timings(pair: &DurationPair, json: bool) -> Result<()> {
    if json {
        return print_json(pair);
    }
    let [started, stopped] = pair.as_array();
    println!("started={} stopped={}", started, stopped);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serializing report")?);
    Ok(())
}
