//! Instrument lineup: the configured basket and its target weights.

use crate::domain::error::GlidepathError;
use std::collections::HashSet;

/// Allowed deviation of the enabled target weights from 100.
pub const LINEUP_WEIGHT_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct LineupEntry {
    pub id: String,
    pub ticker: String,
    pub enabled: bool,
    pub target_pct: f64,
    /// Per-instrument ATR% ceiling; `None` means the global ceiling applies.
    pub atr_override_pct: Option<f64>,
    pub tags: Vec<String>,
}

impl LineupEntry {
    pub fn new(id: &str, ticker: &str, target_pct: f64) -> Self {
        LineupEntry {
            id: id.to_string(),
            ticker: ticker.to_string(),
            enabled: true,
            target_pct,
            atr_override_pct: None,
            tags: Vec::new(),
        }
    }
}

pub fn enabled(lineup: &[LineupEntry]) -> impl Iterator<Item = &LineupEntry> {
    lineup.iter().filter(|e| e.enabled)
}

pub fn find<'a>(lineup: &'a [LineupEntry], ticker: &str) -> Option<&'a LineupEntry> {
    lineup.iter().find(|e| e.ticker == ticker)
}

/// Equal-weight lineup for a cold start with no lineup file.
///
/// Weights are rounded to one decimal; the last entry absorbs the rounding
/// remainder so the enabled total stays at 100.
pub fn default_lineup(tickers: &[String]) -> Vec<LineupEntry> {
    if tickers.is_empty() {
        return Vec::new();
    }
    let n = tickers.len();
    let weight = round_tenth(100.0 / n as f64);
    let last_weight = round_tenth(100.0 - weight * (n - 1) as f64);
    tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| LineupEntry {
            id: format!("ETF_{:02}", i + 1),
            ticker: ticker.clone(),
            enabled: true,
            target_pct: if i + 1 == n { last_weight } else { weight },
            atr_override_pct: None,
            tags: vec!["Core".to_string()],
        })
        .collect()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Structural checks run where configuration is loaded, never inside the engine.
pub fn validate_lineup(lineup: &[LineupEntry]) -> Result<(), GlidepathError> {
    if lineup.is_empty() {
        return Err(GlidepathError::LineupInvalid {
            reason: "lineup is empty".into(),
        });
    }

    let mut seen = HashSet::new();
    for entry in lineup {
        if entry.ticker.trim().is_empty() {
            return Err(GlidepathError::LineupInvalid {
                reason: format!("entry {} has no ticker", entry.id),
            });
        }
        if !seen.insert(entry.ticker.as_str()) {
            return Err(GlidepathError::LineupInvalid {
                reason: format!("duplicate ticker {}", entry.ticker),
            });
        }
        if !entry.target_pct.is_finite() || entry.target_pct < 0.0 {
            return Err(GlidepathError::LineupInvalid {
                reason: format!("{} has invalid target weight {}", entry.ticker, entry.target_pct),
            });
        }
        match entry.atr_override_pct {
            Some(ceiling) if !ceiling.is_finite() || ceiling <= 0.0 => {
                return Err(GlidepathError::LineupInvalid {
                    reason: format!("{} has invalid ATR override {}", entry.ticker, ceiling),
                });
            }
            _ => {}
        }
    }

    if enabled(lineup).next().is_none() {
        return Err(GlidepathError::LineupInvalid {
            reason: "no enabled instruments".into(),
        });
    }

    let total: f64 = enabled(lineup).map(|e| e.target_pct).sum();
    if (total - 100.0).abs() > LINEUP_WEIGHT_TOLERANCE {
        return Err(GlidepathError::LineupInvalid {
            reason: format!("enabled target weights sum to {total:.2}, expected 100"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_entry_lineup() -> Vec<LineupEntry> {
        vec![
            LineupEntry::new("ETF_01", "NIFTYBEES", 60.0),
            LineupEntry::new("ETF_02", "GOLDBEES", 40.0),
        ]
    }

    #[test]
    fn valid_lineup_passes() {
        assert!(validate_lineup(&two_entry_lineup()).is_ok());
    }

    #[test]
    fn empty_lineup_fails() {
        assert!(matches!(
            validate_lineup(&[]),
            Err(GlidepathError::LineupInvalid { .. })
        ));
    }

    #[test]
    fn weights_must_sum_to_hundred() {
        let mut lineup = two_entry_lineup();
        lineup[1].target_pct = 30.0;
        let err = validate_lineup(&lineup).unwrap_err();
        assert!(err.to_string().contains("sum to 90.00"));
    }

    #[test]
    fn disabled_entries_do_not_count_toward_sum() {
        let mut lineup = two_entry_lineup();
        let mut extra = LineupEntry::new("ETF_03", "LIQUIDBEES", 25.0);
        extra.enabled = false;
        lineup.push(extra);
        assert!(validate_lineup(&lineup).is_ok());
    }

    #[test]
    fn duplicate_ticker_fails() {
        let mut lineup = two_entry_lineup();
        lineup[1].ticker = "NIFTYBEES".into();
        let err = validate_lineup(&lineup).unwrap_err();
        assert!(err.to_string().contains("duplicate ticker NIFTYBEES"));
    }

    #[test]
    fn non_positive_override_fails() {
        let mut lineup = two_entry_lineup();
        lineup[0].atr_override_pct = Some(0.0);
        assert!(validate_lineup(&lineup).is_err());
    }

    #[test]
    fn default_lineup_splits_evenly() {
        let tickers: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let lineup = default_lineup(&tickers);
        assert_eq!(lineup.len(), 3);
        assert_eq!(lineup[0].id, "ETF_01");
        assert_eq!(lineup[2].id, "ETF_03");
        assert_eq!(lineup[0].target_pct, 33.3);
        assert_eq!(lineup[1].target_pct, 33.3);
        assert_eq!(lineup[2].target_pct, 33.4);
        assert!(lineup.iter().all(|e| e.enabled));
        assert_eq!(lineup[1].tags, vec!["Core".to_string()]);
        assert!(validate_lineup(&lineup).is_ok());
    }

    #[test]
    fn default_lineup_of_awkward_size_still_validates() {
        let tickers: Vec<String> = (0..19).map(|i| format!("T{i}")).collect();
        let lineup = default_lineup(&tickers);
        assert_eq!(lineup.len(), 19);
        assert!(validate_lineup(&lineup).is_ok());
    }

    #[test]
    fn default_lineup_of_nothing_is_empty() {
        assert!(default_lineup(&[]).is_empty());
    }

    #[test]
    fn find_by_ticker() {
        let lineup = two_entry_lineup();
        assert_eq!(find(&lineup, "GOLDBEES").map(|e| e.target_pct), Some(40.0));
        assert!(find(&lineup, "XYZ").is_none());
    }
}
