//! CSV file state adapter.
//!
//! Reads the lineup, holdings and indicator snapshot from three CSV files.
//! Headers are matched case-insensitively; column order is free.

use crate::domain::error::GlidepathError;
use crate::domain::holding::Holding;
use crate::domain::lineup::{default_lineup, LineupEntry};
use crate::domain::snapshot::{IndicatorKey, Snapshot, SnapshotRow};
use crate::ports::state_port::StatePort;
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct CsvAdapter {
    lineup_path: PathBuf,
    holdings_path: PathBuf,
    snapshot_path: PathBuf,
    universe: Vec<String>,
}

impl CsvAdapter {
    pub fn new(lineup_path: PathBuf, holdings_path: PathBuf, snapshot_path: PathBuf) -> Self {
        Self {
            lineup_path,
            holdings_path,
            snapshot_path,
            universe: Vec::new(),
        }
    }

    /// Tickers used to build an equal-weight lineup when the lineup file is absent.
    pub fn with_universe(mut self, universe: Vec<String>) -> Self {
        self.universe = universe;
        self
    }

    pub fn lineup_path(&self) -> &Path {
        &self.lineup_path
    }

    pub fn holdings_path(&self) -> &Path {
        &self.holdings_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

/// Reads a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<String>, GlidepathError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(input_error(path, format!("failed to read: {e}"))),
    }
}

fn input_error(path: &Path, reason: String) -> GlidepathError {
    GlidepathError::Input {
        file: path.display().to_string(),
        reason,
    }
}

/// Header positions of one CSV file.
struct Columns<'a> {
    path: &'a Path,
    headers: Vec<String>,
}

impl<'a> Columns<'a> {
    fn new(path: &'a Path, headers: &StringRecord) -> Self {
        Self {
            path,
            headers: headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect(),
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, GlidepathError> {
        self.index(name)
            .ok_or_else(|| input_error(self.path, format!("missing {name} column")))
    }

    fn text<'r>(&self, record: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
    }

    fn number(
        &self,
        record: &StringRecord,
        idx: Option<usize>,
        name: &str,
        line: u64,
    ) -> Result<Option<f64>, GlidepathError> {
        let raw = self.text(record, idx);
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>().map(Some).map_err(|e| {
            input_error(self.path, format!("line {line}: invalid {name} value '{raw}': {e}"))
        })
    }

    fn required_number(
        &self,
        record: &StringRecord,
        idx: usize,
        name: &str,
        line: u64,
    ) -> Result<f64, GlidepathError> {
        self.number(record, Some(idx), name, line)?
            .ok_or_else(|| input_error(self.path, format!("line {line}: missing {name} value")))
    }
}

fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_enabled(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "1" | "y" => Some(true),
        "false" | "no" | "0" | "n" => Some(false),
        _ => None,
    }
}

pub fn parse_lineup(path: &Path, content: &str) -> Result<Vec<LineupEntry>, GlidepathError> {
    let mut rdr = reader(content);
    let headers = rdr
        .headers()
        .map_err(|e| input_error(path, format!("CSV parse error: {e}")))?
        .clone();
    let cols = Columns::new(path, &headers);
    let ticker_idx = cols.require("ticker")?;
    let target_idx = cols.require("target_pct")?;
    let id_idx = cols.index("id");
    let enabled_idx = cols.index("enabled");
    let atr_idx = cols.index("atr_override_pct");
    let tags_idx = cols.index("tags");

    let mut entries = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| input_error(path, format!("CSV parse error: {e}")))?;
        let line = record_line(&record);

        let ticker = cols.text(&record, Some(ticker_idx)).to_uppercase();
        let enabled_raw = cols.text(&record, enabled_idx);
        let enabled = parse_enabled(enabled_raw).ok_or_else(|| {
            input_error(path, format!("line {line}: invalid enabled value '{enabled_raw}'"))
        })?;
        let target_pct = cols.required_number(&record, target_idx, "target_pct", line)?;
        let atr_override_pct = cols.number(&record, atr_idx, "atr_override_pct", line)?;
        let id = match cols.text(&record, id_idx) {
            "" => format!("ETF_{:02}", entries.len() + 1),
            id => id.to_string(),
        };
        let tags = cols
            .text(&record, tags_idx)
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        entries.push(LineupEntry {
            id,
            ticker,
            enabled,
            target_pct,
            atr_override_pct,
            tags,
        });
    }
    Ok(entries)
}

pub fn parse_holdings(path: &Path, content: &str) -> Result<Vec<Holding>, GlidepathError> {
    let mut rdr = reader(content);
    let headers = rdr
        .headers()
        .map_err(|e| input_error(path, format!("CSV parse error: {e}")))?
        .clone();
    let cols = Columns::new(path, &headers);
    let ticker_idx = cols.require("ticker")?;
    let units_idx = cols.require("units")?;
    let avg_idx = cols.require("avg_buy_price")?;
    let price_idx = cols.require("current_price")?;
    let current_pct_idx = cols.index("current_pct");
    let target_pct_idx = cols.index("target_pct");
    let gap_idx = cols.index("gap_pct");
    let status_idx = cols.index("status");

    let mut holdings = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| input_error(path, format!("CSV parse error: {e}")))?;
        let line = record_line(&record);

        let ticker = cols.text(&record, Some(ticker_idx)).to_uppercase();
        if ticker.is_empty() {
            return Err(input_error(path, format!("line {line}: missing ticker")));
        }
        holdings.push(Holding {
            ticker,
            units: cols.required_number(&record, units_idx, "units", line)?,
            avg_buy_price: cols.required_number(&record, avg_idx, "avg_buy_price", line)?,
            current_price: cols.required_number(&record, price_idx, "current_price", line)?,
            current_pct: cols
                .number(&record, current_pct_idx, "current_pct", line)?
                .unwrap_or(0.0),
            target_pct: cols
                .number(&record, target_pct_idx, "target_pct", line)?
                .unwrap_or(0.0),
            gap_pct: cols.number(&record, gap_idx, "gap_pct", line)?.unwrap_or(0.0),
            status: cols.text(&record, status_idx).to_string(),
        });
    }
    Ok(holdings)
}

/// Unknown columns are ignored. An unparseable indicator cell is treated as
/// absent so the instrument scores `CALC_ERROR` instead of aborting the load.
pub fn parse_snapshot(path: &Path, content: &str) -> Result<Snapshot, GlidepathError> {
    let mut rdr = reader(content);
    let headers = rdr
        .headers()
        .map_err(|e| input_error(path, format!("CSV parse error: {e}")))?
        .clone();
    let cols = Columns::new(path, &headers);
    let instrument_idx = cols.require("instrument")?;
    let timeframe_idx = cols.require("timeframe")?;
    let close_idx = cols.index("close");

    let indicator_cols: Vec<(usize, IndicatorKey)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| IndicatorKey::from_column(h).map(|k| (i, k)))
        .collect();
    debug!(path = %path.display(), columns = indicator_cols.len(), "snapshot indicator columns resolved");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| input_error(path, format!("CSV parse error: {e}")))?;
        let line = record_line(&record);

        let instrument = cols.text(&record, Some(instrument_idx)).to_uppercase();
        let timeframe = cols.text(&record, Some(timeframe_idx));
        if instrument.is_empty() {
            return Err(input_error(path, format!("line {line}: missing instrument")));
        }
        let close = cols.number(&record, close_idx, "close", line)?;
        let mut row = SnapshotRow::new(&instrument, timeframe, close);

        for &(idx, key) in &indicator_cols {
            match cols.number(&record, Some(idx), key.column(), line) {
                Ok(Some(v)) => {
                    row.indicators.insert(key, v);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(ticker = %instrument, indicator = %key, error = %e, "unreadable indicator value")
                }
            }
        }
        rows.push(row);
    }
    Ok(Snapshot::new(rows))
}

impl StatePort for CsvAdapter {
    fn load_lineup(&self) -> Result<Vec<LineupEntry>, GlidepathError> {
        match read_optional(&self.lineup_path)? {
            Some(content) => parse_lineup(&self.lineup_path, &content),
            None => {
                info!(
                    path = %self.lineup_path.display(),
                    tickers = self.universe.len(),
                    "lineup file not found, using equal-weight default"
                );
                Ok(default_lineup(&self.universe))
            }
        }
    }

    fn load_holdings(&self) -> Result<Vec<Holding>, GlidepathError> {
        match read_optional(&self.holdings_path)? {
            Some(content) => parse_holdings(&self.holdings_path, &content),
            None => {
                info!(path = %self.holdings_path.display(), "holdings file not found, cold start");
                Ok(Vec::new())
            }
        }
    }

    fn load_snapshot(&self) -> Result<Snapshot, GlidepathError> {
        match read_optional(&self.snapshot_path)? {
            Some(content) => parse_snapshot(&self.snapshot_path, &content),
            None => {
                warn!(path = %self.snapshot_path.display(), "snapshot file not found, no indicator data");
                Ok(Snapshot::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn adapter_in(dir: &TempDir) -> CsvAdapter {
        CsvAdapter::new(
            dir.path().join("lineup.csv"),
            dir.path().join("holdings.csv"),
            dir.path().join("snapshot.csv"),
        )
    }

    #[test]
    fn lineup_parses_all_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("lineup.csv"),
            "id,ticker,enabled,target_pct,atr_override_pct,tags\n\
             ETF_01,niftybees,true,60,,Core|Large\n\
             ETF_02,GOLDBEES,no,40,3.5,\n",
        )
        .unwrap();
        let lineup = adapter_in(&dir).load_lineup().unwrap();
        assert_eq!(lineup.len(), 2);
        assert_eq!(lineup[0].ticker, "NIFTYBEES");
        assert!(lineup[0].enabled);
        assert_eq!(lineup[0].atr_override_pct, None);
        assert_eq!(lineup[0].tags, vec!["Core".to_string(), "Large".to_string()]);
        assert!(!lineup[1].enabled);
        assert_eq!(lineup[1].atr_override_pct, Some(3.5));
        assert!(lineup[1].tags.is_empty());
    }

    #[test]
    fn lineup_without_id_column_gets_sequential_ids() {
        let lineup = parse_lineup(Path::new("l.csv"), "ticker,target_pct\nA,50\nB,50\n").unwrap();
        assert_eq!(lineup[0].id, "ETF_01");
        assert_eq!(lineup[1].id, "ETF_02");
        assert!(lineup.iter().all(|e| e.enabled));
    }

    #[test]
    fn missing_lineup_file_uses_universe_default() {
        let dir = TempDir::new().unwrap();
        let adapter = adapter_in(&dir).with_universe(vec!["A".into(), "B".into()]);
        let lineup = adapter.load_lineup().unwrap();
        assert_eq!(lineup.len(), 2);
        assert_relative_eq!(lineup[0].target_pct, 50.0);
        assert_eq!(lineup[1].id, "ETF_02");
    }

    #[test]
    fn lineup_bad_enabled_value_is_input_error() {
        let err = parse_lineup(Path::new("l.csv"), "ticker,enabled,target_pct\nA,maybe,100\n")
            .unwrap_err();
        assert!(matches!(err, GlidepathError::Input { .. }));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn lineup_missing_target_column_is_input_error() {
        let err = parse_lineup(Path::new("l.csv"), "ticker\nA\n").unwrap_err();
        assert!(err.to_string().contains("missing target_pct column"));
    }

    #[test]
    fn holdings_parse_with_optional_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("holdings.csv"),
            "ticker,units,avg_buy_price,current_price,current_pct,status\n\
             GOLDBEES,100,50,55.5,12.5,BUY\n\
             NIFTYBEES,10,200,190,,\n",
        )
        .unwrap();
        let holdings = adapter_in(&dir).load_holdings().unwrap();
        assert_eq!(holdings.len(), 2);
        assert_relative_eq!(holdings[0].current_price, 55.5);
        assert_relative_eq!(holdings[0].current_pct, 12.5);
        assert_eq!(holdings[0].status, "BUY");
        assert_relative_eq!(holdings[1].current_pct, 0.0);
        assert_relative_eq!(holdings[1].target_pct, 0.0);
        assert_eq!(holdings[1].status, "");
    }

    #[test]
    fn missing_holdings_file_is_cold_start() {
        let dir = TempDir::new().unwrap();
        assert!(adapter_in(&dir).load_holdings().unwrap().is_empty());
    }

    #[test]
    fn holdings_with_bad_number_report_line() {
        let err = parse_holdings(
            Path::new("h.csv"),
            "ticker,units,avg_buy_price,current_price\nA,ten,1,1\n",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"), "{msg}");
        assert!(msg.contains("units"), "{msg}");
    }

    #[test]
    fn snapshot_resolves_indicator_columns() {
        let content = "instrument,timeframe,close,RSI,tsi,tsi_signal,vwma,atr,atr_pct,ema_20\n\
                       goldbees,1W,55,62.5,10,5,54,0.5,0.9,53\n";
        let snapshot = parse_snapshot(Path::new("s.csv"), content).unwrap();
        let row = snapshot.get("GOLDBEES", "1W").unwrap();
        assert_relative_eq!(row.close().unwrap(), 55.0);
        assert_relative_eq!(row.value(IndicatorKey::Momentum).unwrap(), 62.5);
        assert_relative_eq!(row.value(IndicatorKey::VolatilityPct).unwrap(), 0.9);
        assert_eq!(row.indicators.len(), 6);
    }

    #[test]
    fn snapshot_empty_or_bad_cells_are_absent() {
        let content = "instrument,timeframe,close,rsi,tsi\nA,1W,,abc,\n";
        let snapshot = parse_snapshot(Path::new("s.csv"), content).unwrap();
        let row = snapshot.get("A", "1W").unwrap();
        assert!(row.close.is_none());
        assert!(row.indicators.is_empty());
    }

    #[test]
    fn snapshot_keeps_every_timeframe() {
        let content = "instrument,timeframe,close\nA,1D,10\nA,1W,11\n";
        let snapshot = parse_snapshot(Path::new("s.csv"), content).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_relative_eq!(snapshot.get("A", "1W").unwrap().close().unwrap(), 11.0);
    }

    #[test]
    fn missing_snapshot_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(adapter_in(&dir).load_snapshot().unwrap().is_empty());
    }
}
