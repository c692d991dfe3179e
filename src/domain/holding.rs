//! Holdings of the tracked sleeve and their derived valuation fields.

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub units: f64,
    pub avg_buy_price: f64,
    pub current_price: f64,
    /// Current weight within the sleeve, in percent.
    pub current_pct: f64,
    pub target_pct: f64,
    pub gap_pct: f64,
    pub status: String,
}

impl Holding {
    pub fn market_value(&self) -> f64 {
        self.units * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.units * self.avg_buy_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.market_value() - self.cost_basis()
    }

    pub fn pnl_pct(&self) -> f64 {
        let cost = self.cost_basis();
        if cost > 0.0 {
            self.unrealized_pnl() / cost * 100.0
        } else {
            0.0
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.current_price > self.avg_buy_price
    }
}

pub fn find<'a>(holdings: &'a [Holding], ticker: &str) -> Option<&'a Holding> {
    holdings.iter().find(|h| h.ticker == ticker)
}

/// Current weight of `ticker`, zero when it is not held.
pub fn current_weight(holdings: &[Holding], ticker: &str) -> f64 {
    find(holdings, ticker).map(|h| h.current_pct).unwrap_or(0.0)
}

/// Aggregate view of the sleeve consumed by the budget calculator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioSummary {
    pub total_sleeve_value: f64,
    pub current_weight_pct: f64,
    pub num_holdings: usize,
}

impl PortfolioSummary {
    /// Values are recomputed from units and prices; persisted market values
    /// are never trusted.
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        PortfolioSummary {
            total_sleeve_value: holdings.iter().map(Holding::market_value).sum(),
            current_weight_pct: holdings.iter().map(|h| h.current_pct).sum(),
            num_holdings: holdings.len(),
        }
    }
}
