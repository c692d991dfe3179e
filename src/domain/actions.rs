//! Action generation: merges budget, health, and harvest results into priced
//! BUY/TRIM orders.
//!
//! Trims are unconditional and come first. Buys go to healthy, underweight
//! instruments, splitting the weekly budget in proportion to each
//! instrument's weight gap, priced at a GTT limit below the weekly close.

use crate::domain::harvest::{HarvestRecord, round_cents};
use crate::domain::health::HealthRecord;
use crate::domain::holding::{self, Holding};
use crate::domain::lineup::{self, LineupEntry};
use crate::domain::params::SystemParams;
use crate::domain::snapshot::{IndicatorKey, Snapshot};
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, info, warn};

/// Fraction of weekly ATR subtracted from the close for the GTT entry price.
pub const GTT_ATR_DISCOUNT: f64 = 0.5;
pub const BUY_REASON: &str = "Health_Pass_Underweight";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Buy,
    Trim,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Buy => f.write_str("BUY"),
            ActionKind::Trim => f.write_str("TRIM"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub date: NaiveDate,
    pub ticker: String,
    pub kind: ActionKind,
    pub units: i64,
    pub price: f64,
    pub value: f64,
    pub reason: String,
}

/// Share of the weekly budget assigned to one eligible instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub ticker: String,
    pub gap: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionInputs<'a> {
    pub as_of: NaiveDate,
    pub weekly_budget: f64,
    pub health: &'a [HealthRecord],
    pub harvest: &'a [HarvestRecord],
    pub holdings: &'a [Holding],
    pub lineup: &'a [LineupEntry],
    pub snapshot: &'a Snapshot,
    pub params: &'a SystemParams,
}

/// Split `budget` across `(ticker, gap)` pairs in proportion to the gaps.
/// Negative gaps count as zero; zero-gap instruments get no allocation.
pub fn allocate_budget(budget: f64, gaps: &[(String, f64)]) -> Vec<Allocation> {
    let total_gap: f64 = gaps.iter().map(|(_, g)| g.max(0.0)).sum();
    if total_gap <= 0.0 || budget <= 0.0 {
        return Vec::new();
    }

    gaps.iter()
        .filter(|(_, g)| *g > 0.0)
        .map(|(ticker, gap)| Allocation {
            ticker: ticker.clone(),
            gap: *gap,
            amount: budget * gap / total_gap,
        })
        .collect()
}

/// Close minus half a weekly ATR. A missing ATR means no discount.
pub fn gtt_price(close: f64, atr: f64) -> f64 {
    close - GTT_ATR_DISCOUNT * atr
}

pub fn generate_weekly_actions(inputs: ActionInputs<'_>) -> Vec<Action> {
    info!(budget = inputs.weekly_budget, "generating actions");

    let mut actions: Vec<Action> = inputs
        .harvest
        .iter()
        .map(|h| Action {
            date: inputs.as_of,
            ticker: h.ticker.clone(),
            kind: ActionKind::Trim,
            units: h.trim_units,
            price: trim_price(&h.ticker, &inputs),
            value: h.est_value,
            reason: h.trigger.to_string(),
        })
        .collect();

    let gaps = eligible_gaps(&inputs);

    if gaps.is_empty() || inputs.weekly_budget <= inputs.params.min_buy_budget {
        info!(
            eligible = gaps.len(),
            budget = inputs.weekly_budget,
            "no eligible buys or insufficient budget"
        );
    } else {
        for allocation in allocate_budget(inputs.weekly_budget, &gaps) {
            if let Some(action) = price_buy(&allocation, &inputs) {
                actions.push(action);
            }
        }
    }

    info!(orders = actions.len(), "actions generated");
    actions
}

/// Healthy, underweight instruments and their weight gap, in health-matrix order.
fn eligible_gaps(inputs: &ActionInputs<'_>) -> Vec<(String, f64)> {
    inputs
        .health
        .iter()
        .filter(|r| r.passed)
        .filter_map(|r| {
            let target = lineup::find(inputs.lineup, &r.ticker)
                .map(|e| e.target_pct)
                .unwrap_or(0.0);
            let current = holding::current_weight(inputs.holdings, &r.ticker);
            (current < target).then(|| (r.ticker.clone(), (target - current).max(0.0)))
        })
        .collect()
}

fn trim_price(ticker: &str, inputs: &ActionInputs<'_>) -> f64 {
    if let Some(h) = holding::find(inputs.holdings, ticker) {
        return h.current_price;
    }
    inputs
        .snapshot
        .get(ticker, &inputs.params.weekly_timeframe)
        .and_then(|row| row.close().ok())
        .unwrap_or(0.0)
}

fn price_buy(allocation: &Allocation, inputs: &ActionInputs<'_>) -> Option<Action> {
    let ticker = allocation.ticker.as_str();
    let row = inputs.snapshot.get(ticker, &inputs.params.weekly_timeframe)?;

    let close = match row.close() {
        Ok(c) if c > 0.0 => c,
        _ => {
            warn!(ticker, "no close price, buy skipped");
            return None;
        }
    };
    let atr = row.value(IndicatorKey::Volatility).unwrap_or_else(|e| {
        debug!(ticker, error = %e, "ATR unavailable, pricing at close");
        0.0
    });

    let price = gtt_price(close, atr);
    if price <= 0.0 {
        warn!(ticker, close, atr, "non-positive GTT price, buy skipped");
        return None;
    }

    let units = (allocation.amount / price).floor() as i64;
    if units <= 0 {
        debug!(ticker, amount = allocation.amount, price, "allocation below one unit");
        return None;
    }

    Some(Action {
        date: inputs.as_of,
        ticker: ticker.to_string(),
        kind: ActionKind::Buy,
        units,
        price: round_cents(price),
        value: round_cents(units as f64 * price),
        reason: BUY_REASON.to_string(),
    })
}
