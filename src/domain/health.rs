//! Health gates: four independent technical checks per lineup instrument.
//!
//! 1. Trend: TSI line above its signal line.
//! 2. Momentum: RSI above 50.
//! 3. Volume trend: close above VWMA. The snapshot holds a single row, so a
//!    real VWMA slope cannot be measured; close > VWMA stands in for it.
//! 4. Risk: ATR% at or below the instrument's ceiling.
//!
//! Only a full score of 4 passes. A failure on one instrument becomes a
//! `CALC_ERROR` record and never stops the batch.

use crate::domain::lineup::{self, LineupEntry};
use crate::domain::params::SystemParams;
use crate::domain::snapshot::{IndicatorKey, Snapshot, SnapshotError, SnapshotRow};
use std::fmt;
use tracing::{error, info, warn};

pub const MOMENTUM_THRESHOLD: f64 = 50.0;
pub const GATE_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthReason {
    Ok,
    GatesFailed,
    NoData,
    CalcError,
}

impl fmt::Display for HealthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthReason::Ok => "OK",
            HealthReason::GatesFailed => "Gates Failed",
            HealthReason::NoData => "NO_DATA",
            HealthReason::CalcError => "CALC_ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthRecord {
    pub ticker: String,
    pub trend_value: f64,
    pub trend_signal: f64,
    pub momentum: f64,
    pub volatility_pct: f64,
    pub volatility_ceiling: f64,
    pub gate_trend: bool,
    pub gate_momentum: bool,
    pub gate_volume: bool,
    pub gate_risk: bool,
    pub score: u8,
    pub passed: bool,
    pub reason: HealthReason,
}

impl HealthRecord {
    pub fn failed(ticker: &str, reason: HealthReason) -> Self {
        HealthRecord {
            ticker: ticker.to_string(),
            trend_value: 0.0,
            trend_signal: 0.0,
            momentum: 0.0,
            volatility_pct: 0.0,
            volatility_ceiling: 0.0,
            gate_trend: false,
            gate_momentum: false,
            gate_volume: false,
            gate_risk: false,
            score: 0,
            passed: false,
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HealthInputs<'a> {
    pub snapshot: &'a Snapshot,
    pub lineup: &'a [LineupEntry],
    pub params: &'a SystemParams,
}

/// Effective risk ceiling: the lineup override when present, else the global one.
pub fn volatility_ceiling(entry: &LineupEntry, params: &SystemParams) -> f64 {
    entry
        .atr_override_pct
        .filter(|v| v.is_finite())
        .unwrap_or(params.atr_ceiling_pct)
}

pub fn run_health_checks(inputs: HealthInputs<'_>) -> Vec<HealthRecord> {
    info!(instruments = inputs.lineup.len(), "health check started");

    if inputs.snapshot.is_empty() {
        warn!("no indicator snapshot available, every health check fails");
    }

    let timeframe = inputs.params.weekly_timeframe.as_str();
    let mut matrix = Vec::new();

    for entry in lineup::enabled(inputs.lineup) {
        let Some(row) = inputs.snapshot.get(&entry.ticker, timeframe) else {
            warn!(ticker = %entry.ticker, timeframe, "no weekly data found");
            matrix.push(HealthRecord::failed(&entry.ticker, HealthReason::NoData));
            continue;
        };

        let ceiling = volatility_ceiling(entry, inputs.params);
        match evaluate_gates(&entry.ticker, row, ceiling) {
            Ok(record) => matrix.push(record),
            Err(e) => {
                error!(ticker = %entry.ticker, error = %e, "health check calculation failed");
                matrix.push(HealthRecord::failed(&entry.ticker, HealthReason::CalcError));
            }
        }
    }

    let passed = matrix.iter().filter(|r| r.passed).count();
    info!(passed, total = matrix.len(), "health check complete");
    matrix
}

pub fn evaluate_gates(
    ticker: &str,
    row: &SnapshotRow,
    ceiling: f64,
) -> Result<HealthRecord, SnapshotError> {
    let trend_value = row.value(IndicatorKey::Trend)?;
    let trend_signal = row.value(IndicatorKey::TrendSignal)?;
    let momentum = row.value(IndicatorKey::Momentum)?;
    let vwma = row.value(IndicatorKey::VolumeTrend)?;
    let volatility_pct = row.value(IndicatorKey::VolatilityPct)?;
    let close = row.close()?;

    let gate_trend = trend_value > trend_signal;
    let gate_momentum = momentum > MOMENTUM_THRESHOLD;
    let gate_volume = close > vwma;
    let gate_risk = volatility_pct <= ceiling;

    let score = [gate_trend, gate_momentum, gate_volume, gate_risk]
        .iter()
        .filter(|g| **g)
        .count() as u8;
    let passed = score == GATE_COUNT;

    Ok(HealthRecord {
        ticker: ticker.to_string(),
        trend_value,
        trend_signal,
        momentum,
        volatility_pct,
        volatility_ceiling: ceiling,
        gate_trend,
        gate_momentum,
        gate_volume,
        gate_risk,
        score,
        passed,
        reason: if passed {
            HealthReason::Ok
        } else {
            HealthReason::GatesFailed
        },
    })
}
