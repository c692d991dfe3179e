//! Indicator snapshot: the latest indicator values per (instrument, timeframe).
//!
//! Indicator columns are resolved once, when a row is built, through the fixed
//! [`IndicatorKey`] registry. Downstream code asks for a key, never for a
//! column-name prefix.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKey {
    /// Relative strength (RSI).
    Momentum,
    /// True strength index line.
    Trend,
    /// Signal line of the true strength index.
    TrendSignal,
    /// Volume-weighted moving average.
    VolumeTrend,
    /// Raw average true range, in price units.
    Volatility,
    /// Average true range as a percentage of close.
    VolatilityPct,
}

impl IndicatorKey {
    pub const ALL: [IndicatorKey; 6] = [
        IndicatorKey::Momentum,
        IndicatorKey::Trend,
        IndicatorKey::TrendSignal,
        IndicatorKey::VolumeTrend,
        IndicatorKey::Volatility,
        IndicatorKey::VolatilityPct,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            IndicatorKey::Momentum => "rsi",
            IndicatorKey::Trend => "tsi",
            IndicatorKey::TrendSignal => "tsi_signal",
            IndicatorKey::VolumeTrend => "vwma",
            IndicatorKey::Volatility => "atr",
            IndicatorKey::VolatilityPct => "atr_pct",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        IndicatorKey::ALL.into_iter().find(|k| k.column() == name)
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("{instrument}: missing indicator {key}")]
    MissingIndicator { instrument: String, key: IndicatorKey },

    #[error("{instrument}: indicator {key} is not finite")]
    NonFinite { instrument: String, key: IndicatorKey },

    #[error("{instrument}: missing close price")]
    MissingClose { instrument: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub instrument: String,
    pub timeframe: String,
    pub close: Option<f64>,
    pub indicators: HashMap<IndicatorKey, f64>,
}

impl SnapshotRow {
    pub fn new(instrument: &str, timeframe: &str, close: Option<f64>) -> Self {
        SnapshotRow {
            instrument: instrument.to_string(),
            timeframe: timeframe.to_string(),
            close,
            indicators: HashMap::new(),
        }
    }

    pub fn with(mut self, key: IndicatorKey, value: f64) -> Self {
        self.indicators.insert(key, value);
        self
    }

    pub fn value(&self, key: IndicatorKey) -> Result<f64, SnapshotError> {
        match self.indicators.get(&key) {
            None => Err(SnapshotError::MissingIndicator {
                instrument: self.instrument.clone(),
                key,
            }),
            Some(v) if !v.is_finite() => Err(SnapshotError::NonFinite {
                instrument: self.instrument.clone(),
                key,
            }),
            Some(v) => Ok(*v),
        }
    }

    pub fn close(&self) -> Result<f64, SnapshotError> {
        match self.close {
            Some(c) if c.is_finite() => Ok(c),
            _ => Err(SnapshotError::MissingClose {
                instrument: self.instrument.clone(),
            }),
        }
    }
}

/// Immutable set of snapshot rows for one decision cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    rows: Vec<SnapshotRow>,
    index: HashMap<(String, String), usize>,
}

impl Snapshot {
    /// The first row for each (instrument, timeframe) pair wins.
    pub fn new(rows: Vec<SnapshotRow>) -> Self {
        let mut index = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            index
                .entry((row.instrument.clone(), row.timeframe.clone()))
                .or_insert(i);
        }
        Snapshot { rows, index }
    }

    pub fn get(&self, instrument: &str, timeframe: &str) -> Option<&SnapshotRow> {
        self.index
            .get(&(instrument.to_string(), timeframe.to_string()))
            .map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
