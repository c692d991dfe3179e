//! Input change detection for the watch loop.
//!
//! Each input source is reduced to a blake3 digest of its raw bytes. A new
//! cycle is only worth running when at least one digest moved since the last
//! observation; the very first observation always forces a refresh.

use blake3::Hash;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFingerprint {
    pub params: Hash,
    pub lineup: Hash,
    pub holdings: Hash,
    pub snapshot: Hash,
}

impl InputFingerprint {
    /// Absent sources should be passed as empty slices.
    pub fn new(params: &[u8], lineup: &[u8], holdings: &[u8], snapshot: &[u8]) -> Self {
        Self {
            params: blake3::hash(params),
            lineup: blake3::hash(lineup),
            holdings: blake3::hash(holdings),
            snapshot: blake3::hash(snapshot),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub params_changed: bool,
    pub lineup_changed: bool,
    pub holdings_changed: bool,
    pub snapshot_changed: bool,
    pub force_refresh: bool,
}

impl ChangeSet {
    pub fn any(&self) -> bool {
        self.force_refresh
            || self.params_changed
            || self.lineup_changed
            || self.holdings_changed
            || self.snapshot_changed
    }

    /// Names of the sources that changed, for log lines.
    pub fn changed_sources(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.params_changed {
            out.push("params");
        }
        if self.lineup_changed {
            out.push("lineup");
        }
        if self.holdings_changed {
            out.push("holdings");
        }
        if self.snapshot_changed {
            out.push("snapshot");
        }
        out
    }
}

#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<InputFingerprint>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares against the previous observation and records the new one.
    pub fn observe(&mut self, current: InputFingerprint) -> ChangeSet {
        let changes = match self.last {
            None => ChangeSet {
                params_changed: true,
                lineup_changed: true,
                holdings_changed: true,
                snapshot_changed: true,
                force_refresh: true,
            },
            Some(prev) => ChangeSet {
                params_changed: prev.params != current.params,
                lineup_changed: prev.lineup != current.lineup,
                holdings_changed: prev.holdings != current.holdings,
                snapshot_changed: prev.snapshot != current.snapshot,
                force_refresh: false,
            },
        };
        debug!(changed = ?changes.changed_sources(), force = changes.force_refresh, "inputs observed");
        self.last = Some(current);
        changes
    }

    /// Forget the last observation so the next one forces a refresh.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
