//! Simulation entry points.
//!
//! Each entry point checks the requested range against the available price
//! history, generates the strategy's ledger, and summarizes it at the current
//! price. A failure at any step yields an error and no partial result.

use crate::domain::bounds::check_range;
use crate::domain::comparison::{Comparison, DipStats};
use crate::domain::error::SipsimError;
use crate::domain::returns::{SimulationResult, summarize};
use crate::domain::strategy::StrategyConfig;
use crate::domain::threshold::DipRules;
use crate::domain::{escalating, periodic, threshold};
use crate::ports::price_port::PriceOracle;
use chrono::NaiveDate;
use tracing::debug;

pub fn run_periodic(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    amount: f64,
    day_of_month: u32,
) -> Result<SimulationResult, SipsimError> {
    ensure_within_history(oracle, start, end)?;
    let ledger = periodic::simulate(oracle, start, end, amount, day_of_month)?;
    Ok(summarize(ledger, oracle.current_price()?))
}

pub fn run_escalating(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    initial_amount: f64,
    annual_increase_pct: f64,
    day_of_month: u32,
) -> Result<SimulationResult, SipsimError> {
    ensure_within_history(oracle, start, end)?;
    let ledger = escalating::simulate(
        oracle,
        start,
        end,
        initial_amount,
        annual_increase_pct,
        day_of_month,
    )?;
    Ok(summarize(ledger, oracle.current_price()?))
}

pub fn run_threshold(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    base_amount: f64,
    dip_rules: &DipRules,
    lookback_days: u32,
) -> Result<SimulationResult, SipsimError> {
    ensure_within_history(oracle, start, end)?;
    let ledger = threshold::simulate(oracle, start, end, base_amount, dip_rules, lookback_days)?;
    Ok(summarize(ledger, oracle.current_price()?))
}

/// Validate `config` and run the matching simulator.
pub fn run(oracle: &dyn PriceOracle, config: &StrategyConfig) -> Result<SimulationResult, SipsimError> {
    config.validate()?;
    let range = config.range();
    debug!(strategy = %config.kind(), start = %range.start, end = %range.end, "running simulation");

    match config {
        StrategyConfig::Periodic { params, .. } => run_periodic(
            oracle,
            range.start,
            range.end,
            params.amount,
            params.day_of_month,
        ),
        StrategyConfig::Escalating { params, .. } => run_escalating(
            oracle,
            range.start,
            range.end,
            params.initial_amount,
            params.annual_increase_pct,
            params.day_of_month,
        ),
        StrategyConfig::Threshold { params, .. } => run_threshold(
            oracle,
            range.start,
            range.end,
            params.base_amount,
            &params.dip_rules,
            params.lookback_days,
        ),
    }
}

/// A strategy result alongside its periodic baseline, when it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub result: SimulationResult,
    pub baseline: Option<SimulationResult>,
    pub comparison: Option<Comparison>,
    pub dip_stats: Option<DipStats>,
}

/// The plain periodic plan `config` is measured against, if any.
pub fn baseline_for(config: &StrategyConfig) -> Option<StrategyConfig> {
    config.baseline()
}

/// Run `config` alone, with dip statistics for threshold plans.
pub fn run_report(
    oracle: &dyn PriceOracle,
    config: &StrategyConfig,
) -> Result<StrategyReport, SipsimError> {
    let result = run(oracle, config)?;
    let dip_stats = matches!(config, StrategyConfig::Threshold { .. })
        .then(|| DipStats::from_ledger(&result.ledger));
    Ok(StrategyReport {
        result,
        baseline: None,
        comparison: None,
        dip_stats,
    })
}

/// Run `config` and its baseline side by side.
///
/// The two runs share nothing but the read-only oracle, so they execute in
/// parallel.
pub fn run_with_baseline(
    oracle: &(dyn PriceOracle + Sync),
    config: &StrategyConfig,
) -> Result<StrategyReport, SipsimError> {
    let baseline_config = baseline_for(config);

    let (result, baseline) = rayon::join(
        || run(oracle, config),
        || baseline_config.as_ref().map(|b| run(oracle, b)).transpose(),
    );
    let result = result?;
    let baseline = baseline?;

    let comparison = baseline
        .as_ref()
        .map(|b| Comparison::between(&result, b));
    let dip_stats = matches!(config, StrategyConfig::Threshold { .. })
        .then(|| DipStats::from_ledger(&result.ledger));

    Ok(StrategyReport {
        result,
        baseline,
        comparison,
        dip_stats,
    })
}

/// `end` must not lie beyond the last recorded close.
fn ensure_within_history(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), SipsimError> {
    check_range(start, end)?;
    match oracle.available_range()? {
        None => Err(SipsimError::invalid_range("no price history available")),
        Some((_, last, _)) if end > last => Err(SipsimError::invalid_range(format!(
            "end date {end} is beyond the available price history (last close {last})"
        ))),
        Some(_) => Ok(()),
    }
}
