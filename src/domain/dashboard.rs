//! Display tables for a finished cycle: enriched holdings, signal matrix,
//! action list, harvest log, and the master dashboard.
//!
//! The dashboard is driven by the lineup. Every lineup instrument gets exactly
//! one row, with defaults standing in for anything missing on a cold start.

use crate::domain::actions::{Action, ActionKind};
use crate::domain::engine::{CycleInputs, CycleOutputs};
use crate::domain::harvest::HarvestRecord;
use crate::domain::health::HealthRecord;
use crate::domain::holding::{self, Holding};
use crate::domain::lineup::LineupEntry;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

pub const CURRENCY: &str = "₹";
pub const NO_STATUS: &str = "NONE";
pub const NO_ACTION: &str = "No Action";
pub const PIPELINE_MODULE: &str = "Pipeline";
/// Longest error text kept in a run log row.
pub const MAX_LOG_MESSAGE_CHARS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Hold,
    Skip,
}

impl Signal {
    pub fn from_score(score: u8) -> Self {
        match score {
            4 => Signal::Buy,
            3 => Signal::Hold,
            _ => Signal::Skip,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Skip => "SKIP",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStateRow {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Units")]
    pub units: f64,
    #[serde(rename = "Avg_Buy_Price")]
    pub avg_buy_price: f64,
    #[serde(rename = "Current_Price")]
    pub current_price: f64,
    #[serde(rename = "Current_%")]
    pub current_pct: f64,
    #[serde(rename = "Target_%")]
    pub target_pct: f64,
    #[serde(rename = "Gap_%")]
    pub gap_pct: f64,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Market_Value")]
    pub market_value: f64,
    #[serde(rename = "Cost_Basis")]
    pub cost_basis: f64,
    #[serde(rename = "Unrealized_P&L")]
    pub unrealized_pnl: f64,
    #[serde(rename = "P&L_%")]
    pub pnl_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    #[serde(rename = "Week_Date")]
    pub week_date: NaiveDate,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "TSI_Val")]
    pub tsi_value: f64,
    #[serde(rename = "TSI_Sig")]
    pub tsi_signal: f64,
    #[serde(rename = "RSI_14")]
    pub rsi: f64,
    #[serde(rename = "ATR_Pct")]
    pub atr_pct: f64,
    #[serde(rename = "ATR_Ceiling")]
    pub atr_ceiling: f64,
    #[serde(rename = "Gate_1_Trend")]
    pub gate_trend: bool,
    #[serde(rename = "Gate_2_Mom")]
    pub gate_momentum: bool,
    #[serde(rename = "Gate_3_Vol")]
    pub gate_volume: bool,
    #[serde(rename = "Gate_4_Risk")]
    pub gate_risk: bool,
    #[serde(rename = "Health_Score")]
    pub health_score: u8,
    #[serde(rename = "Health_Status")]
    pub health_status: bool,
    #[serde(rename = "Reason")]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "ETF")]
    pub ticker: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Units")]
    pub units: i64,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Reason")]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestLogRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "ETF")]
    pub ticker: String,
    #[serde(rename = "Trigger")]
    pub trigger: String,
    #[serde(rename = "Trim_Units")]
    pub trim_units: i64,
    #[serde(rename = "Trim_Pct")]
    pub trim_pct: f64,
    #[serde(rename = "Est_Value")]
    pub est_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Current Weight %")]
    pub current_weight_pct: f64,
    #[serde(rename = "Target Weight %")]
    pub target_weight_pct: f64,
    #[serde(rename = "Gap")]
    pub gap: f64,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Health_Score")]
    pub health_score: u8,
    #[serde(rename = "Signal")]
    pub signal: String,
    #[serde(rename = "Last Close")]
    pub last_close: f64,
    #[serde(rename = "Action This Week")]
    pub action_this_week: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLogRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Module")]
    pub module: String,
    #[serde(rename = "Message")]
    pub message: String,
}

/// All display tables of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub dashboard: Vec<DashboardRow>,
    pub portfolio_state: Vec<PortfolioStateRow>,
    pub signals: Vec<SignalRow>,
    pub weekly_actions: Vec<ActionRow>,
    pub harvest_log: Vec<HarvestLogRow>,
    pub run_log: Vec<RunLogRow>,
}

pub fn enrich_holdings(holdings: &[Holding]) -> Vec<PortfolioStateRow> {
    holdings
        .iter()
        .map(|h| PortfolioStateRow {
            ticker: h.ticker.clone(),
            units: h.units,
            avg_buy_price: h.avg_buy_price,
            current_price: h.current_price,
            current_pct: h.current_pct,
            target_pct: h.target_pct,
            gap_pct: h.gap_pct,
            status: h.status.clone(),
            market_value: h.market_value(),
            cost_basis: h.cost_basis(),
            unrealized_pnl: h.unrealized_pnl(),
            pnl_pct: h.pnl_pct(),
        })
        .collect()
}

pub fn format_signals(health: &[HealthRecord], week_date: NaiveDate) -> Vec<SignalRow> {
    health
        .iter()
        .map(|r| SignalRow {
            week_date,
            ticker: r.ticker.clone(),
            tsi_value: round_to(r.trend_value, 2),
            tsi_signal: round_to(r.trend_signal, 2),
            rsi: round_to(r.momentum, 1),
            atr_pct: round_to(r.volatility_pct, 2),
            atr_ceiling: r.volatility_ceiling,
            gate_trend: r.gate_trend,
            gate_momentum: r.gate_momentum,
            gate_volume: r.gate_volume,
            gate_risk: r.gate_risk,
            health_score: r.score,
            health_status: r.passed,
            reason: r.reason.to_string(),
        })
        .collect()
}

pub fn format_actions(actions: &[Action]) -> Vec<ActionRow> {
    actions
        .iter()
        .map(|a| ActionRow {
            date: a.date,
            ticker: a.ticker.clone(),
            action: a.kind.to_string(),
            units: a.units,
            price: a.price,
            value: a.value,
            reason: a.reason.clone(),
        })
        .collect()
}

pub fn format_harvest_log(harvest: &[HarvestRecord], date: NaiveDate) -> Vec<HarvestLogRow> {
    harvest
        .iter()
        .map(|h| HarvestLogRow {
            date,
            ticker: h.ticker.clone(),
            trigger: h.trigger.to_string(),
            trim_units: h.trim_units,
            trim_pct: round_to(h.trim_pct, 2),
            est_value: h.est_value,
        })
        .collect()
}

/// `Buy ₹X @ ₹Y` or `Trim N units (TRIGGER)`.
pub fn format_action(action: &Action) -> String {
    match action.kind {
        ActionKind::Buy => format!(
            "Buy {CURRENCY}{:.0} @ {CURRENCY}{:.2}",
            action.value, action.price
        ),
        ActionKind::Trim => format!("Trim {} units ({})", action.units, action.reason),
    }
}

/// Left join of lineup with holdings, health, and actions on the ticker.
///
/// An instrument with several actions gets them joined with `"; "` so the
/// row count always equals the lineup size.
pub fn build_dashboard(
    lineup: &[LineupEntry],
    holdings: &[Holding],
    health: &[HealthRecord],
    actions: &[Action],
) -> Vec<DashboardRow> {
    lineup
        .iter()
        .map(|entry| {
            let held = holding::find(holdings, &entry.ticker);
            let score = health
                .iter()
                .find(|r| r.ticker == entry.ticker)
                .map(|r| r.score)
                .unwrap_or(0);
            let action_text: Vec<String> = actions
                .iter()
                .filter(|a| a.ticker == entry.ticker)
                .map(format_action)
                .collect();

            DashboardRow {
                ticker: entry.ticker.clone(),
                current_weight_pct: held.map(|h| h.current_pct).unwrap_or(0.0),
                target_weight_pct: entry.target_pct,
                gap: held.map(|h| h.gap_pct).unwrap_or(0.0),
                status: held
                    .map(|h| h.status.clone())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| NO_STATUS.to_string()),
                health_score: score,
                signal: Signal::from_score(score).to_string(),
                last_close: held.map(|h| h.current_price).unwrap_or(0.0),
                action_this_week: if action_text.is_empty() {
                    NO_ACTION.to_string()
                } else {
                    action_text.join("; ")
                },
            }
        })
        .collect()
}

pub fn format_cycle(
    inputs: &CycleInputs,
    outputs: &CycleOutputs,
    generated_at: NaiveDateTime,
) -> CycleReport {
    let date = inputs.as_of;
    CycleReport {
        dashboard: build_dashboard(
            &inputs.lineup,
            &inputs.holdings,
            &outputs.health,
            &outputs.actions,
        ),
        portfolio_state: enrich_holdings(&inputs.holdings),
        signals: format_signals(&outputs.health, date),
        weekly_actions: format_actions(&outputs.actions),
        harvest_log: format_harvest_log(&outputs.harvest, date),
        run_log: vec![log_row(
            "SUCCESS",
            format!("Run Complete. Budget: {:.2}", outputs.budget.weekly_budget),
            generated_at,
        )],
    }
}

/// Run log for a cycle that did not complete.
pub fn failure_log(reason: &str, generated_at: NaiveDateTime) -> Vec<RunLogRow> {
    let reason: String = reason.chars().take(MAX_LOG_MESSAGE_CHARS).collect();
    vec![log_row("ERROR", format!("Run Failed: {reason}"), generated_at)]
}

fn log_row(level: &str, message: String, at: NaiveDateTime) -> RunLogRow {
    RunLogRow {
        timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        level: level.to_string(),
        module: PIPELINE_MODULE.to_string(),
        message,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
