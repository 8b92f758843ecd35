//! Strategy configuration.
//!
//! Each strategy is a typed record; `validate` rejects anything the simulators
//! would refuse, so a validated config always runs unless prices are missing.

use crate::domain::bounds::{
    check_amount, check_day_of_month, check_increase_pct, check_lookback, check_range,
};
use crate::domain::error::SipsimError;
use crate::domain::threshold::{BASE_DAY_OF_MONTH, DipRules};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicParams {
    pub amount: f64,
    pub day_of_month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscalatingParams {
    pub initial_amount: f64,
    pub annual_increase_pct: f64,
    pub day_of_month: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdParams {
    pub base_amount: f64,
    pub dip_rules: DipRules,
    pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    Periodic {
        range: DateRange,
        params: PeriodicParams,
    },
    Escalating {
        range: DateRange,
        params: EscalatingParams,
    },
    Threshold {
        range: DateRange,
        params: ThresholdParams,
    },
}

impl StrategyConfig {
    pub fn range(&self) -> DateRange {
        match self {
            StrategyConfig::Periodic { range, .. }
            | StrategyConfig::Escalating { range, .. }
            | StrategyConfig::Threshold { range, .. } => *range,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::Periodic { .. } => StrategyKind::Periodic,
            StrategyConfig::Escalating { .. } => StrategyKind::Escalating,
            StrategyConfig::Threshold { .. } => StrategyKind::Threshold,
        }
    }

    pub fn validate(&self) -> Result<(), SipsimError> {
        let range = self.range();
        check_range(range.start, range.end)?;

        match self {
            StrategyConfig::Periodic { params, .. } => {
                check_amount("amount", params.amount)?;
                check_day_of_month(params.day_of_month)?;
            }
            StrategyConfig::Escalating { params, .. } => {
                check_amount("initial_amount", params.initial_amount)?;
                check_increase_pct(params.annual_increase_pct)?;
                check_day_of_month(params.day_of_month)?;
            }
            StrategyConfig::Threshold { params, .. } => {
                check_amount("base_amount", params.base_amount)?;
                check_lookback(params.lookback_days)?;
            }
        }
        Ok(())
    }

    /// The plain periodic plan a strategy is measured against.
    ///
    /// Escalating plans compare with their initial amount on the same day;
    /// threshold plans with their base amount on the 1st. Periodic plans have
    /// no baseline.
    pub fn baseline(&self) -> Option<StrategyConfig> {
        match self {
            StrategyConfig::Periodic { .. } => None,
            StrategyConfig::Escalating { range, params } => Some(StrategyConfig::Periodic {
                range: *range,
                params: PeriodicParams {
                    amount: params.initial_amount,
                    day_of_month: params.day_of_month,
                },
            }),
            StrategyConfig::Threshold { range, params } => Some(StrategyConfig::Periodic {
                range: *range,
                params: PeriodicParams {
                    amount: params.base_amount,
                    day_of_month: BASE_DAY_OF_MONTH,
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Periodic,
    Escalating,
    Threshold,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Periodic => "periodic",
            StrategyKind::Escalating => "escalating",
            StrategyKind::Threshold => "threshold",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "periodic" | "sip" | "regular" => Ok(StrategyKind::Periodic),
            "escalating" | "step-up" | "stepup" => Ok(StrategyKind::Escalating),
            "threshold" | "dip" => Ok(StrategyKind::Threshold),
            other => Err(format!(
                "unknown strategy '{other}' (expected periodic, escalating or threshold)"
            )),
        }
    }
}
