//! Harvest: rule-triggered partial profit-taking on winning positions.
//!
//! Triggers are checked in priority order and the first match wins. Trim size
//! is capped per instrument and then clipped so the post-trim weight never
//! drops below the hard floor, the higher of the drift floor and core floor.

use crate::domain::holding::Holding;
use crate::domain::params::SystemParams;
use crate::domain::snapshot::{IndicatorKey, Snapshot, SnapshotError, SnapshotRow};
use std::fmt;
use tracing::{debug, info, warn};

pub const STRETCH_MOMENTUM: f64 = 70.0;
/// Fixed ATR% proxy for a volatility spike; no percentile history is available.
pub const VOL_SPIKE_ATR_PCT: f64 = 3.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestTrigger {
    Stretch,
    VolSpike,
    Breakdown,
}

impl HarvestTrigger {
    pub fn base_trim_pct(&self) -> f64 {
        match self {
            HarvestTrigger::Stretch => 10.0,
            HarvestTrigger::VolSpike => 15.0,
            HarvestTrigger::Breakdown => 15.0,
        }
    }
}

impl fmt::Display for HarvestTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HarvestTrigger::Stretch => "H1_Stretch",
            HarvestTrigger::VolSpike => "H2_VolSpike",
            HarvestTrigger::Breakdown => "H3_Breakdown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestRecord {
    pub ticker: String,
    pub trigger: HarvestTrigger,
    pub trim_units: i64,
    pub trim_pct: f64,
    pub est_value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct HarvestInputs<'a> {
    pub holdings: &'a [Holding],
    pub snapshot: &'a Snapshot,
    pub params: &'a SystemParams,
}

/// First matching trigger, or `None` when the row shows no reason to trim.
pub fn check_trigger(row: &SnapshotRow) -> Result<Option<HarvestTrigger>, SnapshotError> {
    if row.value(IndicatorKey::Momentum)? > STRETCH_MOMENTUM {
        return Ok(Some(HarvestTrigger::Stretch));
    }
    if row.value(IndicatorKey::VolatilityPct)? > VOL_SPIKE_ATR_PCT {
        return Ok(Some(HarvestTrigger::VolSpike));
    }
    // Single-row snapshot: "below signal" stands in for a fresh cross down.
    if row.value(IndicatorKey::Trend)? < row.value(IndicatorKey::TrendSignal)? {
        return Ok(Some(HarvestTrigger::Breakdown));
    }
    Ok(None)
}

/// Weight below which a trim may not push `target_pct`.
pub fn hard_floor(target_pct: f64, params: &SystemParams) -> f64 {
    let drift_floor = target_pct - params.drift_band_pct;
    let core_floor = target_pct * params.core_floor_pct / 100.0;
    drift_floor.max(core_floor)
}

/// Trim percentage after the per-instrument cap and the floor clip.
/// `None` when the holding already sits at or below its floor.
pub fn clip_trim_pct(
    base_trim_pct: f64,
    current_pct: f64,
    floor_pct: f64,
    max_trim_pct: f64,
) -> Option<f64> {
    let trim_pct = base_trim_pct.min(max_trim_pct);
    let post_trim = current_pct * (1.0 - trim_pct / 100.0);
    if post_trim >= floor_pct {
        return Some(trim_pct);
    }

    let allowed_shed = (current_pct - floor_pct).max(0.0);
    if allowed_shed <= 0.0 || current_pct <= 0.0 {
        return None;
    }
    Some(allowed_shed / current_pct * 100.0)
}

pub fn find_harvest_triggers(inputs: HarvestInputs<'_>) -> Vec<HarvestRecord> {
    info!(holdings = inputs.holdings.len(), "harvest check started");

    if inputs.holdings.is_empty() {
        info!("portfolio is empty, no harvest needed");
        return Vec::new();
    }

    let params = inputs.params;
    let mut records = Vec::new();

    for holding in inputs.holdings {
        if !holding.is_profitable() {
            continue;
        }

        let Some(row) = inputs.snapshot.get(&holding.ticker, &params.weekly_timeframe) else {
            debug!(ticker = %holding.ticker, "no weekly data, harvest skipped");
            continue;
        };

        let trigger = match check_trigger(row) {
            Ok(Some(t)) => t,
            Ok(None) => continue,
            Err(e) => {
                warn!(ticker = %holding.ticker, error = %e, "harvest trigger check failed");
                continue;
            }
        };

        let floor = hard_floor(holding.target_pct, params);
        let Some(trim_pct) = clip_trim_pct(
            trigger.base_trim_pct(),
            holding.current_pct,
            floor,
            params.max_trim_per_instrument_pct,
        ) else {
            info!(
                ticker = %holding.ticker,
                weight = holding.current_pct,
                floor,
                "harvest skipped, weight at floor"
            );
            continue;
        };

        let trim_units = (holding.units * trim_pct / 100.0).floor() as i64;
        if trim_units <= 0 {
            continue;
        }

        let est_value = round_cents(trim_units as f64 * holding.current_price);
        info!(
            ticker = %holding.ticker,
            trigger = %trigger,
            trim_units,
            trim_pct,
            "harvest triggered"
        );
        records.push(HarvestRecord {
            ticker: holding.ticker.clone(),
            trigger,
            trim_units,
            trim_pct,
            est_value,
        });
    }

    records
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
