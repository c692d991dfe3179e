//! Weekly budget from the target-vs-current gap and the glide path.

use crate::domain::holding::PortfolioSummary;
use crate::domain::params::SystemParams;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BudgetResult {
    /// Capital deployable this cycle.
    pub weekly_budget: f64,
    /// Signed distance to the target sleeve size, in currency.
    pub gap_to_target: f64,
    /// Part of the uncapped glide budget that the caps withheld. Reported only.
    pub accrued_carry: f64,
    pub initial_capital: f64,
    pub current_pct: f64,
    pub effective_cap: f64,
}

pub fn calculate_weekly_budget(summary: &PortfolioSummary, params: &SystemParams) -> BudgetResult {
    let capital = params.initial_capital;
    let sleeve_value = summary.total_sleeve_value;

    let current_pct = if sleeve_value > 0.0 && capital > 0.0 {
        sleeve_value / capital * 100.0
    } else {
        0.0
    };

    let gap_pct = params.target_allocation_pct - current_pct;
    let gap_value = gap_pct / 100.0 * capital;

    let base_budget = if gap_value > 0.0 && params.weeks_to_glide > 0.0 {
        gap_value / params.weeks_to_glide
    } else {
        0.0
    };

    let transfer_cap = params.weekly_transfer_cap_pct / 100.0 * capital;
    let sleeve_cap = params.sleeve_weekly_budget_cap_pct / 100.0 * capital;
    let effective_cap = transfer_cap.min(sleeve_cap);

    let weekly_budget = base_budget.min(effective_cap).max(0.0);
    let accrued_carry = (base_budget - weekly_budget).max(0.0);

    info!(
        capital,
        target_pct = params.target_allocation_pct,
        current_pct,
        gap_value,
        weekly_budget,
        effective_cap,
        "weekly budget calculated"
    );

    BudgetResult {
        weekly_budget,
        gap_to_target: gap_value,
        accrued_carry,
        initial_capital: capital,
        current_pct,
        effective_cap,
    }
}
