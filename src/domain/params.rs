//! System parameters with hardcoded fallback defaults.
//!
//! Every lookup falls back to the documented default when the key is absent or
//! unparsable, so a missing parameter is never fatal for a decision cycle.

use crate::ports::config_port::ConfigPort;

pub const PARAMS_SECTION: &str = "params";

pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;
pub const DEFAULT_TARGET_ALLOCATION_PCT: f64 = 34.0;
pub const DEFAULT_WEEKS_TO_GLIDE: f64 = 52.0;
pub const DEFAULT_WEEKLY_TRANSFER_CAP_PCT: f64 = 5.0;
pub const DEFAULT_SLEEVE_WEEKLY_BUDGET_CAP_PCT: f64 = 1.25;
pub const DEFAULT_ATR_CEILING_PCT: f64 = 2.0;
pub const DEFAULT_DRIFT_BAND_PCT: f64 = 10.0;
pub const DEFAULT_CORE_FLOOR_PCT: f64 = 70.0;
pub const DEFAULT_MAX_TRIM_PER_INSTRUMENT_PCT: f64 = 25.0;
pub const DEFAULT_MIN_BUY_BUDGET: f64 = 1000.0;
pub const DEFAULT_WEEKLY_TIMEFRAME: &str = "1W";

#[derive(Debug, Clone, PartialEq)]
pub struct SystemParams {
    /// Total investor capital the sleeve is measured against.
    pub initial_capital: f64,
    /// Target sleeve size as a percentage of `initial_capital`.
    pub target_allocation_pct: f64,
    pub weeks_to_glide: f64,
    pub weekly_transfer_cap_pct: f64,
    pub sleeve_weekly_budget_cap_pct: f64,
    /// Global ATR% ceiling for the risk gate; lineup entries may override it.
    pub atr_ceiling_pct: f64,
    pub drift_band_pct: f64,
    pub core_floor_pct: f64,
    pub max_trim_per_instrument_pct: f64,
    /// Budgets at or below this amount produce no buys.
    pub min_buy_budget: f64,
    /// Snapshot timeframe label consulted by the engine.
    pub weekly_timeframe: String,
}

impl Default for SystemParams {
    fn default() -> Self {
        SystemParams {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            target_allocation_pct: DEFAULT_TARGET_ALLOCATION_PCT,
            weeks_to_glide: DEFAULT_WEEKS_TO_GLIDE,
            weekly_transfer_cap_pct: DEFAULT_WEEKLY_TRANSFER_CAP_PCT,
            sleeve_weekly_budget_cap_pct: DEFAULT_SLEEVE_WEEKLY_BUDGET_CAP_PCT,
            atr_ceiling_pct: DEFAULT_ATR_CEILING_PCT,
            drift_band_pct: DEFAULT_DRIFT_BAND_PCT,
            core_floor_pct: DEFAULT_CORE_FLOOR_PCT,
            max_trim_per_instrument_pct: DEFAULT_MAX_TRIM_PER_INSTRUMENT_PCT,
            min_buy_budget: DEFAULT_MIN_BUY_BUDGET,
            weekly_timeframe: DEFAULT_WEEKLY_TIMEFRAME.to_string(),
        }
    }
}

impl SystemParams {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let d = SystemParams::default();
        let get = |key: &str, default: f64| config.get_double(PARAMS_SECTION, key, default);

        SystemParams {
            initial_capital: get("initial_capital", d.initial_capital),
            target_allocation_pct: get("target_allocation_pct", d.target_allocation_pct),
            weeks_to_glide: get("weeks_to_glide", d.weeks_to_glide),
            weekly_transfer_cap_pct: get("weekly_transfer_cap_pct", d.weekly_transfer_cap_pct),
            sleeve_weekly_budget_cap_pct: get(
                "sleeve_weekly_budget_cap_pct",
                d.sleeve_weekly_budget_cap_pct,
            ),
            atr_ceiling_pct: get("atr_ceiling_pct", d.atr_ceiling_pct),
            drift_band_pct: get("drift_band_pct", d.drift_band_pct),
            core_floor_pct: get("core_floor_pct", d.core_floor_pct),
            max_trim_per_instrument_pct: get(
                "max_trim_per_instrument_pct",
                d.max_trim_per_instrument_pct,
            ),
            min_buy_budget: get("min_buy_budget", d.min_buy_budget),
            weekly_timeframe: config
                .get_string(PARAMS_SECTION, "weekly_timeframe")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(d.weekly_timeframe),
        }
    }
}
