//! Report output port trait.

use crate::domain::dashboard::{CycleReport, RunLogRow};
use crate::domain::error::GlidepathError;
use std::path::Path;

/// Port for persisting the formatted output of one cycle.
pub trait ReportPort {
    fn write(&self, report: &CycleReport, output_dir: &Path) -> Result<(), GlidepathError>;

    /// Replaces only the run log, leaving the other sheets of the last good cycle.
    fn write_run_log(&self, rows: &[RunLogRow], output_dir: &Path) -> Result<(), GlidepathError>;
}
