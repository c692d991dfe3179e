//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::run_lock::RunLock;
use crate::domain::actions::ActionKind;
use crate::domain::change_detection::{ChangeDetector, InputFingerprint};
use crate::domain::config_validation::validate_params_config;
use crate::domain::dashboard::{failure_log, format_cycle, CURRENCY};
use crate::domain::engine::{run_cycle, CycleInputs, CycleOutputs};
use crate::domain::error::GlidepathError;
use crate::domain::lineup::{self, validate_lineup};
use crate::domain::params::SystemParams;
use crate::logging::{init_logging, LogFormat, DEFAULT_LEVEL};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::state_port::StatePort;

pub const DEFAULT_LINEUP_FILE: &str = "lineup.csv";
pub const DEFAULT_HOLDINGS_FILE: &str = "holdings.csv";
pub const DEFAULT_SNAPSHOT_FILE: &str = "snapshot.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_POLL_INTERVAL_SECONDS: i64 = 10;

#[derive(Parser, Debug)]
#[command(name = "glidepath", about = "ETF glide-path rebalancing decision engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one decision cycle and write the report sheets
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Output directory (overrides [output] dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Action date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Validate configuration and lineup without running a cycle
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Poll the inputs and re-run whenever one of them changes
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop after this many polls
        #[arg(long)]
        max_cycles: Option<u64>,
        /// Seconds between polls (overrides [watch] poll_interval_seconds)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            output,
            as_of,
        } => run_once(&config, output.as_deref(), as_of),
        Command::Validate { config } => run_validate(&config),
        Command::Watch {
            config,
            output,
            max_cycles,
            interval,
        } => run_watch(&config, output.as_deref(), max_cycles, interval),
    }
}

fn fail(err: &GlidepathError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, GlidepathError> {
    FileConfigAdapter::from_file(path).map_err(|e| GlidepathError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn init_logging_from(config: &dyn ConfigPort) {
    let format = config
        .get_string("logging", "format")
        .and_then(|f| match f.parse::<LogFormat>() {
            Ok(format) => Some(format),
            Err(e) => {
                eprintln!("warning: {e}");
                None
            }
        })
        .unwrap_or_default();
    let level = config
        .get_string("logging", "level")
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    init_logging(format, &level);
}

pub fn build_state_adapter(config: &FileConfigAdapter) -> CsvAdapter {
    CsvAdapter::new(
        config.get_path("inputs", "lineup", DEFAULT_LINEUP_FILE),
        config.get_path("inputs", "holdings", DEFAULT_HOLDINGS_FILE),
        config.get_path("inputs", "snapshot", DEFAULT_SNAPSHOT_FILE),
    )
    .with_universe(config.get_list("universe", "tickers"))
}

pub fn resolve_output_dir(config: &FileConfigAdapter, cli_override: Option<&Path>) -> PathBuf {
    match cli_override {
        Some(dir) => dir.to_path_buf(),
        None => config.get_path("output", "dir", DEFAULT_OUTPUT_DIR),
    }
}

/// Validates configuration and loads every input for one cycle.
pub fn build_cycle_inputs(
    config: &dyn ConfigPort,
    state: &dyn StatePort,
    as_of: NaiveDate,
) -> Result<CycleInputs, GlidepathError> {
    validate_params_config(config)?;
    let params = SystemParams::from_config(config);

    let lineup = state.load_lineup()?;
    validate_lineup(&lineup)?;
    let holdings = state.load_holdings()?;
    let snapshot = state.load_snapshot()?;

    info!(
        instruments = lineup.len(),
        holdings = holdings.len(),
        snapshot_rows = snapshot.len(),
        "inputs loaded"
    );

    Ok(CycleInputs {
        as_of,
        lineup,
        holdings,
        snapshot,
        params,
    })
}

/// Runs one guarded cycle: lock, load, decide, write.
///
/// A cycle that fails after the lock is taken still leaves an `ERROR` row in
/// the run log; the other sheets keep the last successful cycle.
pub fn execute_cycle(
    config: &dyn ConfigPort,
    state: &dyn StatePort,
    report: &dyn ReportPort,
    output_dir: &Path,
    as_of: NaiveDate,
) -> Result<CycleOutputs, GlidepathError> {
    let _lock = RunLock::acquire(output_dir)?;
    let result = decide_and_write(config, state, report, output_dir, as_of);
    if let Err(e) = &result {
        record_failure(report, output_dir, e);
    }
    result
}

fn decide_and_write(
    config: &dyn ConfigPort,
    state: &dyn StatePort,
    report: &dyn ReportPort,
    output_dir: &Path,
    as_of: NaiveDate,
) -> Result<CycleOutputs, GlidepathError> {
    let inputs = build_cycle_inputs(config, state, as_of)?;
    let outputs = run_cycle(&inputs);
    let sheets = format_cycle(&inputs, &outputs, Local::now().naive_local());
    report.write(&sheets, output_dir)?;
    Ok(outputs)
}

fn record_failure(report: &dyn ReportPort, output_dir: &Path, err: &GlidepathError) {
    let rows = failure_log(&err.to_string(), Local::now().naive_local());
    if let Err(e) = report.write_run_log(&rows, output_dir) {
        warn!(error = %e, "could not record failed run");
    }
}

fn print_summary(outputs: &CycleOutputs, output_dir: &Path) {
    let passed = outputs.health.iter().filter(|h| h.passed).count();
    let buys = outputs
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::Buy)
        .count();
    let trims = outputs.actions.len() - buys;
    let deployed: f64 = outputs
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::Buy)
        .map(|a| a.value)
        .sum();

    eprintln!("\n=== Cycle Summary ===");
    eprintln!(
        "Sleeve Value:     {CURRENCY}{:.2} ({:.2}% of capital)",
        outputs.summary.total_sleeve_value, outputs.budget.current_pct
    );
    eprintln!("Weekly Budget:    {CURRENCY}{:.2}", outputs.budget.weekly_budget);
    eprintln!("Carry Forward:    {CURRENCY}{:.2}", outputs.budget.accrued_carry);
    eprintln!("Health Passed:    {}/{}", passed, outputs.health.len());
    eprintln!("Harvest Triggers: {}", outputs.harvest.len());
    eprintln!("Actions:          {buys} buys, {trims} trims");
    eprintln!("Deployed:         {CURRENCY}{deployed:.2}");

    if !outputs.actions.is_empty() {
        eprintln!("\n=== Weekly Actions ===");
        for a in &outputs.actions {
            eprintln!(
                "  {} {}: {} units @ {CURRENCY}{:.2} ({})",
                a.kind, a.ticker, a.units, a.price, a.reason
            );
        }
    }
    eprintln!("\nReport written to: {}", output_dir.display());
}

fn run_once(config_path: &Path, output: Option<&Path>, as_of: Option<NaiveDate>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    init_logging_from(&config);

    let state = build_state_adapter(&config);
    let output_dir = resolve_output_dir(&config, output);
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    match execute_cycle(&config, &state, &CsvReportAdapter::new(), &output_dir, as_of) {
        Ok(outputs) => {
            print_summary(&outputs, &output_dir);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_params_config(&config) {
        return fail(&e);
    }
    let params = SystemParams::from_config(&config);

    let state = build_state_adapter(&config);
    let entries = match state.load_lineup() {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_lineup(&entries) {
        return fail(&e);
    }

    let enabled: Vec<_> = lineup::enabled(&entries).collect();
    let weight_sum: f64 = enabled.iter().map(|e| e.target_pct).sum();

    eprintln!("\nParameters:");
    eprintln!("  Initial Capital:  {CURRENCY}{:.2}", params.initial_capital);
    eprintln!("  Target Sleeve:    {:.2}%", params.target_allocation_pct);
    eprintln!("  Weeks To Glide:   {}", params.weeks_to_glide);
    eprintln!("  ATR Ceiling:      {:.2}%", params.atr_ceiling_pct);
    eprintln!("  Timeframe:        {}", params.weekly_timeframe);
    eprintln!(
        "\nLineup: {} instruments ({} enabled, weights sum to {:.2})",
        entries.len(),
        enabled.len(),
        weight_sum
    );
    for e in &entries {
        eprintln!(
            "  {} {:<12} {:>6.2}%{}",
            e.id,
            e.ticker,
            e.target_pct,
            if e.enabled { "" } else { "  (disabled)" }
        );
    }
    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

fn read_or_empty(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_default()
}

fn fingerprint(config_path: &Path, state: &CsvAdapter) -> InputFingerprint {
    InputFingerprint::new(
        &read_or_empty(config_path),
        &read_or_empty(state.lineup_path()),
        &read_or_empty(state.holdings_path()),
        &read_or_empty(state.snapshot_path()),
    )
}

fn run_watch(
    config_path: &Path,
    output: Option<&Path>,
    max_cycles: Option<u64>,
    interval: Option<u64>,
) -> ExitCode {
    eprintln!("Watching inputs of {}", config_path.display());
    let initial = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    init_logging_from(&initial);
    let interval_secs = interval.unwrap_or_else(|| {
        initial
            .get_int("watch", "poll_interval_seconds", DEFAULT_POLL_INTERVAL_SECONDS)
            .max(1) as u64
    });
    drop(initial);

    let mut detector = ChangeDetector::new();
    let mut polls: u64 = 0;
    let mut last_result = ExitCode::SUCCESS;

    loop {
        polls += 1;
        match load_config(config_path) {
            Ok(config) => {
                let state = build_state_adapter(&config);
                let changes = detector.observe(fingerprint(config_path, &state));
                if changes.any() {
                    info!(poll = polls, changed = ?changes.changed_sources(), "inputs changed, running cycle");
                    let output_dir = resolve_output_dir(&config, output);
                    let as_of = Local::now().date_naive();
                    match execute_cycle(&config, &state, &CsvReportAdapter::new(), &output_dir, as_of) {
                        Ok(outputs) => {
                            print_summary(&outputs, &output_dir);
                            last_result = ExitCode::SUCCESS;
                        }
                        Err(e) => {
                            error!(error = %e, "cycle failed");
                            // retry on the next poll even if nothing changes
                            detector.reset();
                            last_result = (&e).into();
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "config unreadable, skipping poll");
                last_result = (&e).into();
            }
        }

        if max_cycles.is_some_and(|max| polls >= max) {
            break;
        }
        thread::sleep(Duration::from_secs(interval_secs));
    }
    last_result
}
