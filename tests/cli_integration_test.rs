//! CLI integration tests for the run, validate and watch commands.
//!
//! Tests cover:
//! - Config loading and path resolution with real INI files on disk
//! - Full cycles over CSV inputs written to a temp directory
//! - Cold start without lineup or holdings files
//! - Single-flight locking of the output directory
//! - Watch mode with a bounded number of polls

mod common;

use clap::Parser;
use common::*;
use glidepath::adapters::csv_report_adapter::CsvReportAdapter;
use glidepath::adapters::run_lock::{RunLock, LOCK_FILE_NAME};
use glidepath::cli::{self, Cli};
use glidepath::domain::actions::ActionKind;
use glidepath::domain::error::GlidepathError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG_INI: &str = r#"
[params]
initial_capital = 1000000
target_allocation_pct = 34
weeks_to_glide = 52
weekly_transfer_cap_pct = 5
sleeve_weekly_budget_cap_pct = 1.25
atr_ceiling_pct = 2.0

[inputs]
lineup = lineup.csv
holdings = holdings.csv
snapshot = snapshot.csv

[output]
dir = out

[universe]
tickers = NIFTYBEES, GOLDBEES

[logging]
format = pretty
level = warn
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: TempDir::new().unwrap(),
        };
        ws.write("glidepath.ini", CONFIG_INI);
        ws
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.dir.path().join(name), content).unwrap();
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config_path(&self) -> PathBuf {
        self.path("glidepath.ini")
    }

    fn out(&self) -> PathBuf {
        self.path("out")
    }

    fn with_standard_inputs(self) -> Self {
        self.write(
            "lineup.csv",
            &format!("{LINEUP_HEADER}\nETF_01,NIFTYBEES,true,60,,Core\nETF_02,GOLDBEES,true,40,2.5,Hedge\n"),
        );
        self.write(
            "holdings.csv",
            &format!("{HOLDINGS_HEADER}\nNIFTYBEES,100,90,100,100,60,-40,OVERWEIGHT\n"),
        );
        self.write(
            "snapshot.csv",
            &format!(
                "{SNAPSHOT_HEADER}\n\
                 NIFTYBEES,1W,100,10,5,72,95,1.5,1.5\n\
                 GOLDBEES,1W,50,3,1,55,48,1,2.2\n\
                 GOLDBEES,1D,51,3,1,55,48,1,2.2\n"
            ),
        );
        self
    }
}

fn read_sheet(dir: &Path, name: &str) -> Vec<String> {
    fs::read_to_string(dir.join(name))
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn execute(ws: &Workspace) -> Result<glidepath::domain::engine::CycleOutputs, GlidepathError> {
    let config = cli::load_config(&ws.config_path())?;
    let state = cli::build_state_adapter(&config);
    let out = cli::resolve_output_dir(&config, None);
    cli::execute_cycle(&config, &state, &CsvReportAdapter::new(), &out, as_of())
}

mod config_loading {
    use super::*;

    #[test]
    fn missing_config_is_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/glidepath.ini")).unwrap_err();
        assert!(matches!(err, GlidepathError::ConfigParse { .. }));
    }

    #[test]
    fn paths_resolve_relative_to_config() {
        let ws = Workspace::new();
        let config = cli::load_config(&ws.config_path()).unwrap();
        let state = cli::build_state_adapter(&config);
        assert_eq!(state.lineup_path(), ws.path("lineup.csv"));
        assert_eq!(state.snapshot_path(), ws.path("snapshot.csv"));
        assert_eq!(cli::resolve_output_dir(&config, None), ws.out());
    }
}

mod run_command {
    use super::*;

    #[test]
    fn full_cycle_writes_all_sheets() {
        let ws = Workspace::new().with_standard_inputs();
        let outputs = execute(&ws).unwrap();

        assert_eq!(outputs.health.len(), 2);
        // GOLDBEES override ceiling is 2.5, so ATR% 2.2 passes.
        assert!(outputs.health.iter().all(|h| h.passed));
        assert_eq!(outputs.harvest.len(), 1);
        assert_eq!(outputs.actions[0].kind, ActionKind::Trim);
        assert_eq!(outputs.actions[1].ticker, "GOLDBEES");

        let out = ws.out();
        let dashboard = read_sheet(&out, "dashboard.csv");
        assert_eq!(dashboard.len(), 3);
        assert!(dashboard[0].starts_with("Ticker,Current Weight %"));
        assert!(dashboard[1].starts_with("NIFTYBEES,"));
        assert!(dashboard[1].contains("Trim 10 units (H1_Stretch)"));

        assert_eq!(read_sheet(&out, "weekly_actions.csv").len(), 3);
        assert_eq!(read_sheet(&out, "signals.csv").len(), 3);
        assert_eq!(read_sheet(&out, "harvest_log.csv").len(), 2);
        assert_eq!(read_sheet(&out, "portfolio_state.csv").len(), 2);
        let run_log = read_sheet(&out, "run_log.csv");
        assert!(run_log[1].contains("Run Complete. Budget: 6346.15"));
        assert!(!out.join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn cold_start_uses_universe_and_empty_holdings() {
        let ws = Workspace::new();
        ws.write(
            "snapshot.csv",
            &format!("{SNAPSHOT_HEADER}\nNIFTYBEES,1W,100,10,5,60,95,1,1\n"),
        );
        let outputs = execute(&ws).unwrap();

        assert_eq!(outputs.summary.num_holdings, 0);
        assert_eq!(outputs.health.len(), 2);
        assert!(outputs.health[0].passed);
        assert!(!outputs.health[1].passed);
        assert_eq!(outputs.actions.len(), 1);
        assert_eq!(outputs.actions[0].ticker, "NIFTYBEES");

        let dashboard = read_sheet(&ws.out(), "dashboard.csv");
        assert_eq!(dashboard.len(), 3);
        assert!(dashboard[2].contains("No Action"));
        // Header only.
        assert_eq!(read_sheet(&ws.out(), "portfolio_state.csv").len(), 1);
    }

    #[test]
    fn missing_snapshot_scores_no_data() {
        let ws = Workspace::new();
        let outputs = execute(&ws).unwrap();
        assert!(outputs.health.iter().all(|h| h.score == 0 && !h.passed));
        assert!(outputs.actions.is_empty());
    }

    #[test]
    fn invalid_lineup_aborts_before_writing() {
        let ws = Workspace::new();
        ws.write("lineup.csv", &format!("{LINEUP_HEADER}\nETF_01,A,true,70,,\nETF_02,B,true,20,,\n"));
        let err = execute(&ws).unwrap_err();
        assert!(matches!(err, GlidepathError::LineupInvalid { .. }));
        assert!(!ws.out().join("dashboard.csv").exists());
        assert!(!ws.out().join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn failed_cycle_is_recorded_in_run_log() {
        let ws = Workspace::new().with_standard_inputs();
        execute(&ws).unwrap();
        ws.write("lineup.csv", &format!("{LINEUP_HEADER}\nETF_01,A,true,70,,\n"));
        execute(&ws).unwrap_err();

        let run_log = read_sheet(&ws.out(), "run_log.csv");
        assert_eq!(run_log.len(), 2);
        assert!(run_log[1].contains(",ERROR,Pipeline,"));
        assert!(run_log[1].contains("Run Failed: invalid lineup"));
        // The last good dashboard stays in place.
        assert_eq!(read_sheet(&ws.out(), "dashboard.csv").len(), 3);
    }

    #[test]
    fn non_finite_capital_is_rejected() {
        let ws = Workspace::new().with_standard_inputs();
        ws.write(
            "glidepath.ini",
            &CONFIG_INI.replace("initial_capital = 1000000", "initial_capital = inf"),
        );
        let err = execute(&ws).unwrap_err();
        assert!(matches!(err, GlidepathError::ConfigInvalid { ref key, .. } if key == "initial_capital"));
        assert!(!ws.out().join("weekly_actions.csv").exists());
        assert!(read_sheet(&ws.out(), "run_log.csv")[1].contains("ERROR"));
    }

    #[test]
    fn held_lock_leaves_run_log_untouched() {
        let ws = Workspace::new().with_standard_inputs();
        let _held = RunLock::acquire(&ws.out()).unwrap();
        execute(&ws).unwrap_err();
        assert!(!ws.out().join("run_log.csv").exists());
    }

    #[test]
    fn held_lock_blocks_a_second_run() {
        let ws = Workspace::new().with_standard_inputs();
        let _held = RunLock::acquire(&ws.out()).unwrap();
        let err = execute(&ws).unwrap_err();
        assert!(matches!(err, GlidepathError::RunLocked { .. }));
    }

    #[test]
    fn run_subcommand_writes_to_output_override() {
        let ws = Workspace::new().with_standard_inputs();
        let target = ws.path("elsewhere");
        let cli = Cli::try_parse_from([
            "glidepath",
            "run",
            "--config",
            ws.config_path().to_str().unwrap(),
            "--output",
            target.to_str().unwrap(),
            "--as-of",
            "2024-06-07",
        ])
        .unwrap();
        cli::run(cli);

        let actions = read_sheet(&target, "weekly_actions.csv");
        assert_eq!(actions.len(), 3);
        assert!(actions[1].starts_with("2024-06-07,NIFTYBEES,TRIM"));
        assert!(!ws.out().exists());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn validate_leaves_no_output() {
        let ws = Workspace::new().with_standard_inputs();
        let cli = Cli::try_parse_from([
            "glidepath",
            "validate",
            "--config",
            ws.config_path().to_str().unwrap(),
        ])
        .unwrap();
        cli::run(cli);
        assert!(!ws.out().exists());
    }
}

mod watch_command {
    use super::*;

    #[test]
    fn single_poll_forces_a_cycle() {
        let ws = Workspace::new().with_standard_inputs();
        let cli = Cli::try_parse_from([
            "glidepath",
            "watch",
            "--config",
            ws.config_path().to_str().unwrap(),
            "--max-cycles",
            "1",
            "--interval",
            "1",
        ])
        .unwrap();
        cli::run(cli);
        assert_eq!(read_sheet(&ws.out(), "dashboard.csv").len(), 3);
        assert!(!ws.out().join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn failed_poll_leaves_error_row() {
        let ws = Workspace::new();
        ws.write("lineup.csv", &format!("{LINEUP_HEADER}\nETF_01,A,true,50,,\n"));
        let cli = Cli::try_parse_from([
            "glidepath",
            "watch",
            "--config",
            ws.config_path().to_str().unwrap(),
            "--max-cycles",
            "1",
        ])
        .unwrap();
        cli::run(cli);

        let run_log = read_sheet(&ws.out(), "run_log.csv");
        assert_eq!(run_log.len(), 2);
        assert!(run_log[1].contains(",ERROR,Pipeline,"));
        assert!(run_log[1].contains("Run Failed: invalid lineup"));
        assert!(!ws.out().join("dashboard.csv").exists());
    }
}
