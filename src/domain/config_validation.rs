//! Configuration validation at the load boundary.
//!
//! The engine tolerates any parameter value; these checks run before a cycle
//! so that an out-of-range setting is reported instead of silently producing
//! an empty action list.

use crate::domain::error::GlidepathError;
use crate::domain::params::*;
use crate::ports::config_port::ConfigPort;

pub fn validate_params_config(config: &dyn ConfigPort) -> Result<(), GlidepathError> {
    validate_initial_capital(config)?;
    check_range(config, "target_allocation_pct", DEFAULT_TARGET_ALLOCATION_PCT, Bound::Exclusive(0.0), 100.0)?;
    validate_weeks_to_glide(config)?;
    check_range(config, "weekly_transfer_cap_pct", DEFAULT_WEEKLY_TRANSFER_CAP_PCT, Bound::Exclusive(0.0), 100.0)?;
    check_range(config, "sleeve_weekly_budget_cap_pct", DEFAULT_SLEEVE_WEEKLY_BUDGET_CAP_PCT, Bound::Exclusive(0.0), 100.0)?;
    check_range(config, "drift_band_pct", DEFAULT_DRIFT_BAND_PCT, Bound::Inclusive(0.0), 50.0)?;
    check_range(config, "core_floor_pct", DEFAULT_CORE_FLOOR_PCT, Bound::Inclusive(0.0), 100.0)?;
    check_range(config, "atr_ceiling_pct", DEFAULT_ATR_CEILING_PCT, Bound::Exclusive(0.0), 10.0)?;
    check_range(config, "max_trim_per_instrument_pct", DEFAULT_MAX_TRIM_PER_INSTRUMENT_PCT, Bound::Exclusive(0.0), 100.0)?;
    validate_min_buy_budget(config)?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Inclusive(f64),
    Exclusive(f64),
}

fn invalid(key: &str, reason: String) -> GlidepathError {
    GlidepathError::ConfigInvalid {
        section: PARAMS_SECTION.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn check_range(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
    lower: Bound,
    upper: f64,
) -> Result<(), GlidepathError> {
    let value = config.get_double(PARAMS_SECTION, key, default);
    let above_lower = match lower {
        Bound::Inclusive(min) => value >= min,
        Bound::Exclusive(min) => value > min,
    };
    if !value.is_finite() || !above_lower || value > upper {
        let (open, min) = match lower {
            Bound::Inclusive(min) => ("[", min),
            Bound::Exclusive(min) => ("(", min),
        };
        return Err(invalid(
            key,
            format!("{key} must be in {open}{min}, {upper}], got {value}"),
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), GlidepathError> {
    let value = config.get_double(PARAMS_SECTION, "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "initial_capital",
            format!("initial_capital must be a positive number, got {value}"),
        ));
    }
    Ok(())
}

fn validate_weeks_to_glide(config: &dyn ConfigPort) -> Result<(), GlidepathError> {
    let value = config.get_double(PARAMS_SECTION, "weeks_to_glide", DEFAULT_WEEKS_TO_GLIDE);
    if !value.is_finite() || value < 1.0 {
        return Err(invalid(
            "weeks_to_glide",
            format!("weeks_to_glide must be at least 1, got {value}"),
        ));
    }
    Ok(())
}

fn validate_min_buy_budget(config: &dyn ConfigPort) -> Result<(), GlidepathError> {
    let value = config.get_double(PARAMS_SECTION, "min_buy_budget", DEFAULT_MIN_BUY_BUDGET);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "min_buy_budget",
            format!("min_buy_budget must be a non-negative number, got {value}"),
        ));
    }
    Ok(())
}
