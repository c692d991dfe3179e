//! Portfolio state port trait.

use crate::domain::error::GlidepathError;
use crate::domain::holding::Holding;
use crate::domain::lineup::LineupEntry;
use crate::domain::snapshot::Snapshot;

/// Source of the three per-cycle inputs. Implementations return owned copies;
/// the engine never reads back through the port mid-cycle.
pub trait StatePort {
    fn load_lineup(&self) -> Result<Vec<LineupEntry>, GlidepathError>;

    /// An absent holdings source is a cold start, not an error.
    fn load_holdings(&self) -> Result<Vec<Holding>, GlidepathError>;

    fn load_snapshot(&self) -> Result<Snapshot, GlidepathError>;
}
