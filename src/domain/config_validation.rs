//! Configuration validation.
//!
//! Checks presence and format of every key a simulation needs before the
//! typed `StrategyConfig` is built. Range and amount bounds are left to
//! `StrategyConfig::validate`.

use crate::domain::error::SipsimError;
use crate::domain::presets::{DipPreset, PeriodicPreset, StepUpPreset};
use crate::domain::price::PriceLookup;
use crate::domain::strategy::StrategyKind;
use crate::domain::threshold::DipRules;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub const SIMULATION: &str = "simulation";
pub const PRICES: &str = "prices";

/// Validate `[prices]` and `[simulation]`, then the section of the selected
/// strategy. Returns the strategy that will run.
pub fn validate_simulation_config(
    config: &dyn ConfigPort,
    strategy_override: Option<StrategyKind>,
) -> Result<StrategyKind, SipsimError> {
    validate_price_source(config)?;
    validate_dates(config)?;
    let kind = match strategy_override {
        Some(kind) => kind,
        None => strategy_kind(config)?,
    };
    validate_strategy_section(config, kind)?;
    Ok(kind)
}

pub fn validate_price_source(config: &dyn ConfigPort) -> Result<(), SipsimError> {
    let source = required_string(config, PRICES, "source")?;
    match source.trim().to_lowercase().as_str() {
        "csv" => {
            required_string(config, PRICES, "path")?;
        }
        "sqlite" => {
            if config.get_string(PRICES, "path").is_none()
                && config.get_string("sqlite", "path").is_none()
            {
                return Err(missing("sqlite", "path"));
            }
            if let Some(size) = config.get_string("sqlite", "pool_size") {
                match size.trim().parse::<u32>() {
                    Ok(n) if n > 0 => {}
                    _ => {
                        return Err(invalid(
                            "sqlite",
                            "pool_size",
                            "pool_size must be a positive integer",
                        ));
                    }
                }
            }
        }
        other => {
            return Err(invalid(
                PRICES,
                "source",
                format!("unknown price source '{other}' (expected csv or sqlite)"),
            ));
        }
    }
    optional_parsed::<PriceLookup>(config, PRICES, "lookup")?;
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SipsimError> {
    let start = read_date(config, SIMULATION, "start_date")?;
    let end = read_date(config, SIMULATION, "end_date")?;
    if start >= end {
        return Err(invalid(
            SIMULATION,
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// `[simulation] strategy`, defaulting to periodic when absent.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, SipsimError> {
    Ok(optional_parsed::<StrategyKind>(config, SIMULATION, "strategy")?
        .unwrap_or(StrategyKind::Periodic))
}

pub fn validate_strategy_section(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<(), SipsimError> {
    let section = kind.name();
    match kind {
        StrategyKind::Periodic => {
            optional_parsed::<PeriodicPreset>(config, section, "preset")?;
            read_f64(config, section, "amount")?;
            read_u32(config, section, "day_of_month")?;
        }
        StrategyKind::Escalating => {
            optional_parsed::<StepUpPreset>(config, section, "preset")?;
            read_f64(config, section, "initial_amount")?;
            read_f64(config, section, "annual_increase_pct")?;
            read_u32(config, section, "day_of_month")?;
        }
        StrategyKind::Threshold => {
            optional_parsed::<DipPreset>(config, section, "preset")?;
            read_f64(config, section, "base_amount")?;
            read_u32(config, section, "lookback_days")?;
            read_dip_rules(config, section)?;
        }
    }
    Ok(())
}

pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, SipsimError> {
    let value = required_string(config, section, key)?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            section,
            key,
            format!("invalid {key} format, expected YYYY-MM-DD"),
        )
    })
}

/// An optional number; present but unparseable is an error.
pub fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, SipsimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(section, key, format!("'{raw}' is not a number"))),
        },
    }
}

pub fn read_u32(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<u32>, SipsimError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u32>().map(Some).map_err(|_| {
            invalid(
                section,
                key,
                format!("'{raw}' is not a non-negative integer"),
            )
        }),
    }
}

pub fn read_dip_rules(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<Option<DipRules>, SipsimError> {
    match config.get_string(section, "rules") {
        None => Ok(None),
        Some(raw) => raw
            .parse::<DipRules>()
            .map(Some)
            .map_err(|e| invalid(section, "rules", e.to_string())),
    }
}

pub fn optional_parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, SipsimError>
where
    T: FromStr<Err = String>,
{
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|reason| invalid(section, key, reason)),
    }
}

fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SipsimError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(missing(section, key)),
    }
}

fn missing(section: &str, key: &str) -> SipsimError {
    SipsimError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SipsimError {
    SipsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const BASE: &str = "[prices]\nsource = csv\npath = prices.csv\n\n[simulation]\nstart_date = 2015-01-01\nend_date = 2024-12-31\n";

    fn with(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{BASE}{extra}"))
    }

    #[test]
    fn minimal_config_defaults_to_periodic() {
        let config = with("");
        assert_eq!(
            validate_simulation_config(&config, None).unwrap(),
            StrategyKind::Periodic
        );
    }

    #[test]
    fn full_threshold_config_passes() {
        let config = with(
            "strategy = dip\n\n[threshold]\npreset = moderate\nbase_amount = 10000\nlookback_days = 45\nrules = 5:5000, 10:10000\n",
        );
        assert_eq!(
            validate_simulation_config(&config, None).unwrap(),
            StrategyKind::Threshold
        );
    }

    #[test]
    fn override_selects_section() {
        let config = with("\n[escalating]\nannual_increase_pct = lots\n");
        assert!(validate_simulation_config(&config, None).is_ok());
        let err = validate_simulation_config(&config, Some(StrategyKind::Escalating)).unwrap_err();
        assert!(
            matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "annual_increase_pct")
        );
    }

    #[test]
    fn missing_source_fails() {
        let config = make_config("[simulation]\nstart_date = 2015-01-01\nend_date = 2024-12-31\n");
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigMissing { key, .. } if key == "source"));
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[prices]\nsource = parquet\n");
        let err = validate_price_source(&config).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn csv_source_needs_path() {
        let config = make_config("[prices]\nsource = csv\n");
        let err = validate_price_source(&config).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn sqlite_path_may_live_in_sqlite_section() {
        let config = make_config("[prices]\nsource = sqlite\n\n[sqlite]\npath = prices.db\npool_size = 2\n");
        assert!(validate_price_source(&config).is_ok());
    }

    #[test]
    fn sqlite_zero_pool_fails() {
        let config = make_config("[prices]\nsource = sqlite\n\n[sqlite]\npath = prices.db\npool_size = 0\n");
        let err = validate_price_source(&config).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "pool_size"));
    }

    #[test]
    fn bad_lookup_fails() {
        let config = make_config("[prices]\nsource = csv\npath = p.csv\nlookup = nearest\n");
        let err = validate_price_source(&config).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "lookup"));
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config(
            "[prices]\nsource = csv\npath = p.csv\n\n[simulation]\nstart_date = 2015/01/01\nend_date = 2024-12-31\n",
        );
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config =
            make_config("[prices]\nsource = csv\npath = p.csv\n\n[simulation]\nstart_date = 2015-01-01\n");
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(
            "[prices]\nsource = csv\npath = p.csv\n\n[simulation]\nstart_date = 2024-12-31\nend_date = 2015-01-01\n",
        );
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = with("strategy = lumpsum\n");
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "strategy"));
    }

    #[test]
    fn unknown_preset_fails() {
        let config = with("\n[periodic]\npreset = reckless\n");
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "preset"));
    }

    #[test]
    fn non_numeric_day_fails() {
        let config = with("\n[periodic]\nday_of_month = first\n");
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "day_of_month"));
    }

    #[test]
    fn malformed_rules_fail() {
        let config = with("strategy = threshold\n\n[threshold]\nrules = 5-5000\n");
        let err = validate_simulation_config(&config, None).unwrap_err();
        assert!(matches!(err, SipsimError::ConfigInvalid { key, .. } if key == "rules"));
    }

    #[test]
    fn read_helpers_report_absent_as_none() {
        let config = with("");
        assert_eq!(read_f64(&config, "periodic", "amount").unwrap(), None);
        assert_eq!(read_u32(&config, "threshold", "lookback_days").unwrap(), None);
        assert!(read_dip_rules(&config, "threshold").unwrap().is_none());
    }
}
