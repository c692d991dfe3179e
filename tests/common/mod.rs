#![allow(dead_code)]

use chrono::NaiveDate;
use glidepath::domain::engine::CycleInputs;
use glidepath::domain::error::GlidepathError;
pub use glidepath::domain::holding::Holding;
pub use glidepath::domain::lineup::LineupEntry;
use glidepath::domain::params::SystemParams;
pub use glidepath::domain::snapshot::{IndicatorKey, Snapshot, SnapshotRow};
use glidepath::ports::state_port::StatePort;

pub struct MockStatePort {
    pub lineup: Vec<LineupEntry>,
    pub holdings: Vec<Holding>,
    pub snapshot: Snapshot,
    pub snapshot_error: Option<String>,
}

impl MockStatePort {
    pub fn new(lineup: Vec<LineupEntry>) -> Self {
        Self {
            lineup,
            holdings: Vec::new(),
            snapshot: Snapshot::default(),
            snapshot_error: None,
        }
    }

    pub fn with_holdings(mut self, holdings: Vec<Holding>) -> Self {
        self.holdings = holdings;
        self
    }

    pub fn with_snapshot(mut self, rows: Vec<SnapshotRow>) -> Self {
        self.snapshot = Snapshot::new(rows);
        self
    }

    pub fn with_snapshot_error(mut self, reason: &str) -> Self {
        self.snapshot_error = Some(reason.to_string());
        self
    }
}

impl StatePort for MockStatePort {
    fn load_lineup(&self) -> Result<Vec<LineupEntry>, GlidepathError> {
        Ok(self.lineup.clone())
    }

    fn load_holdings(&self) -> Result<Vec<Holding>, GlidepathError> {
        Ok(self.holdings.clone())
    }

    fn load_snapshot(&self) -> Result<Snapshot, GlidepathError> {
        if let Some(reason) = &self.snapshot_error {
            return Err(GlidepathError::Input {
                file: "snapshot".into(),
                reason: reason.clone(),
            });
        }
        Ok(self.snapshot.clone())
    }
}

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 7).unwrap()
}

pub fn ab_lineup() -> Vec<LineupEntry> {
    vec![
        LineupEntry::new("ETF_01", "A", 60.0),
        LineupEntry::new("ETF_02", "B", 40.0),
    ]
}

pub fn make_holding(
    ticker: &str,
    units: f64,
    avg_buy_price: f64,
    current_price: f64,
    current_pct: f64,
    target_pct: f64,
) -> Holding {
    Holding {
        ticker: ticker.to_string(),
        units,
        avg_buy_price,
        current_price,
        current_pct,
        target_pct,
        gap_pct: target_pct - current_pct,
        status: String::new(),
    }
}

/// Weekly row that passes all four health gates and triggers no harvest.
pub fn healthy_row(ticker: &str, close: f64) -> SnapshotRow {
    SnapshotRow::new(ticker, "1W", Some(close))
        .with(IndicatorKey::Trend, 10.0)
        .with(IndicatorKey::TrendSignal, 5.0)
        .with(IndicatorKey::Momentum, 60.0)
        .with(IndicatorKey::VolumeTrend, close * 0.95)
        .with(IndicatorKey::Volatility, 1.0)
        .with(IndicatorKey::VolatilityPct, 1.0)
}

pub fn make_row(
    ticker: &str,
    close: f64,
    trend: f64,
    signal: f64,
    momentum: f64,
    vwma: f64,
    atr_pct: f64,
) -> SnapshotRow {
    SnapshotRow::new(ticker, "1W", Some(close))
        .with(IndicatorKey::Trend, trend)
        .with(IndicatorKey::TrendSignal, signal)
        .with(IndicatorKey::Momentum, momentum)
        .with(IndicatorKey::VolumeTrend, vwma)
        .with(IndicatorKey::Volatility, close * atr_pct / 100.0)
        .with(IndicatorKey::VolatilityPct, atr_pct)
}

pub fn make_inputs(
    lineup: Vec<LineupEntry>,
    holdings: Vec<Holding>,
    rows: Vec<SnapshotRow>,
) -> CycleInputs {
    CycleInputs {
        as_of: as_of(),
        lineup,
        holdings,
        snapshot: Snapshot::new(rows),
        params: SystemParams::default(),
    }
}

pub const SNAPSHOT_HEADER: &str = "instrument,timeframe,close,tsi,tsi_signal,rsi,vwma,atr,atr_pct";

pub const LINEUP_HEADER: &str = "id,ticker,enabled,target_pct,atr_override_pct,tags";

pub const HOLDINGS_HEADER: &str =
    "ticker,units,avg_buy_price,current_price,current_pct,target_pct,gap_pct,status";
