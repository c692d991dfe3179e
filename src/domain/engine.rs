//! One decision cycle: budget, health, harvest, then actions.
//!
//! Each stage takes explicit immutable inputs and returns its own output; the
//! cycle threads those outputs forward. Nothing is kept between cycles, and
//! callers must not run two cycles concurrently against the same output.

use crate::domain::actions::{self, Action, ActionInputs};
use crate::domain::budget::{self, BudgetResult};
use crate::domain::harvest::{self, HarvestInputs, HarvestRecord};
use crate::domain::health::{self, HealthInputs, HealthRecord};
use crate::domain::holding::{Holding, PortfolioSummary};
use crate::domain::lineup::LineupEntry;
use crate::domain::params::SystemParams;
use crate::domain::snapshot::Snapshot;
use chrono::NaiveDate;
use tracing::info_span;

#[derive(Debug, Clone)]
pub struct CycleInputs {
    pub as_of: NaiveDate,
    pub lineup: Vec<LineupEntry>,
    pub holdings: Vec<Holding>,
    pub snapshot: Snapshot,
    pub params: SystemParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutputs {
    pub summary: PortfolioSummary,
    pub budget: BudgetResult,
    pub health: Vec<HealthRecord>,
    pub harvest: Vec<HarvestRecord>,
    pub actions: Vec<Action>,
}

pub fn run_cycle(inputs: &CycleInputs) -> CycleOutputs {
    let _span = info_span!("cycle", as_of = %inputs.as_of).entered();

    let summary = PortfolioSummary::from_holdings(&inputs.holdings);
    let budget = budget::calculate_weekly_budget(&summary, &inputs.params);

    let health = health::run_health_checks(HealthInputs {
        snapshot: &inputs.snapshot,
        lineup: &inputs.lineup,
        params: &inputs.params,
    });

    let harvest = harvest::find_harvest_triggers(HarvestInputs {
        holdings: &inputs.holdings,
        snapshot: &inputs.snapshot,
        params: &inputs.params,
    });

    let actions = actions::generate_weekly_actions(ActionInputs {
        as_of: inputs.as_of,
        weekly_budget: budget.weekly_budget,
        health: &health,
        harvest: &harvest,
        holdings: &inputs.holdings,
        lineup: &inputs.lineup,
        snapshot: &inputs.snapshot,
        params: &inputs.params,
    });

    CycleOutputs {
        summary,
        budget,
        health,
        harvest,
        actions,
    }
}
