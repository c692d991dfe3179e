//! CSV sheet writer for cycle reports.
//!
//! One file per table. Each sheet is written to a temporary sibling and then
//! renamed into place, so a reader never sees a half-written file.

use crate::domain::dashboard::{
    ActionRow, CycleReport, DashboardRow, HarvestLogRow, PortfolioStateRow, RunLogRow, SignalRow,
};
use crate::domain::error::GlidepathError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A table that can be written as one CSV sheet.
pub trait Sheet: Serialize {
    const FILE_NAME: &'static str;
    /// Header row used when the sheet has no data rows.
    const HEADERS: &'static [&'static str];
}

impl Sheet for DashboardRow {
    const FILE_NAME: &'static str = "dashboard.csv";
    const HEADERS: &'static [&'static str] = &[
        "Ticker",
        "Current Weight %",
        "Target Weight %",
        "Gap",
        "Status",
        "Health_Score",
        "Signal",
        "Last Close",
        "Action This Week",
    ];
}

impl Sheet for PortfolioStateRow {
    const FILE_NAME: &'static str = "portfolio_state.csv";
    const HEADERS: &'static [&'static str] = &[
        "Ticker",
        "Units",
        "Avg_Buy_Price",
        "Current_Price",
        "Current_%",
        "Target_%",
        "Gap_%",
        "Status",
        "Market_Value",
        "Cost_Basis",
        "Unrealized_P&L",
        "P&L_%",
    ];
}

impl Sheet for SignalRow {
    const FILE_NAME: &'static str = "signals.csv";
    const HEADERS: &'static [&'static str] = &[
        "Week_Date",
        "Ticker",
        "TSI_Val",
        "TSI_Sig",
        "RSI_14",
        "ATR_Pct",
        "ATR_Ceiling",
        "Gate_1_Trend",
        "Gate_2_Mom",
        "Gate_3_Vol",
        "Gate_4_Risk",
        "Health_Score",
        "Health_Status",
        "Reason",
    ];
}

impl Sheet for ActionRow {
    const FILE_NAME: &'static str = "weekly_actions.csv";
    const HEADERS: &'static [&'static str] =
        &["Date", "ETF", "Action", "Units", "Price", "Value", "Reason"];
}

impl Sheet for HarvestLogRow {
    const FILE_NAME: &'static str = "harvest_log.csv";
    const HEADERS: &'static [&'static str] = &[
        "Date",
        "ETF",
        "Trigger",
        "Trim_Units",
        "Trim_Pct",
        "Est_Value",
    ];
}

impl Sheet for RunLogRow {
    const FILE_NAME: &'static str = "run_log.csv";
    const HEADERS: &'static [&'static str] = &["Timestamp", "Level", "Module", "Message"];
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn output_error(path: &Path, reason: String) -> GlidepathError {
    GlidepathError::Output {
        file: path.display().to_string(),
        reason,
    }
}

pub fn render_sheet<T: Sheet>(rows: &[T]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!rows.is_empty())
        .from_writer(Vec::new());
    if rows.is_empty() {
        wtr.write_record(T::HEADERS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

pub fn write_sheet<T: Sheet>(rows: &[T], output_dir: &Path) -> Result<(), GlidepathError> {
    let path = output_dir.join(T::FILE_NAME);
    let bytes = render_sheet(rows).map_err(|e| output_error(&path, e.to_string()))?;
    let tmp = output_dir.join(format!("{}.tmp", T::FILE_NAME));
    fs::write(&tmp, bytes).map_err(|e| output_error(&tmp, e.to_string()))?;
    fs::rename(&tmp, &path).map_err(|e| output_error(&path, e.to_string()))?;
    debug!(file = %path.display(), rows = rows.len(), "sheet written");
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &CycleReport, output_dir: &Path) -> Result<(), GlidepathError> {
        fs::create_dir_all(output_dir).map_err(|e| output_error(output_dir, e.to_string()))?;
        write_sheet(&report.dashboard, output_dir)?;
        write_sheet(&report.portfolio_state, output_dir)?;
        write_sheet(&report.signals, output_dir)?;
        write_sheet(&report.weekly_actions, output_dir)?;
        write_sheet(&report.harvest_log, output_dir)?;
        write_sheet(&report.run_log, output_dir)?;
        info!(dir = %output_dir.display(), "report sheets written");
        Ok(())
    }

    fn write_run_log(&self, rows: &[RunLogRow], output_dir: &Path) -> Result<(), GlidepathError> {
        fs::create_dir_all(output_dir).map_err(|e| output_error(output_dir, e.to_string()))?;
        write_sheet(rows, output_dir)
    }
}
