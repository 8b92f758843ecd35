//! Periodic investing plus opportunistic purchases on drawdowns.
//!
//! Two producers run independently over the same range: the monthly
//! contribution on the 1st, and a daily scan that fires when the close has
//! fallen far enough below its lookback peak. The dip scan skips any date the
//! monthly producer already used, then both are merged by date and the running
//! totals are refolded in one pass.

use crate::domain::bounds::{check_amount, check_fall_pct, check_lookback, check_range};
use crate::domain::error::SipsimError;
use crate::domain::ledger::{EventKind, Ledger};
use crate::domain::periodic;
use crate::domain::price::fall_percentage;
use crate::ports::price_port::PriceOracle;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Day of month for the base contribution of a threshold strategy.
pub const BASE_DAY_OF_MONTH: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipRule {
    pub fall_percentage: f64,
    pub invest_amount: f64,
}

impl DipRule {
    pub fn new(fall_percentage: f64, invest_amount: f64) -> Self {
        Self {
            fall_percentage,
            invest_amount,
        }
    }
}

impl fmt::Display for DipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.fall_percentage, self.invest_amount)
    }
}

/// A validated, non-empty rule set ordered by ascending threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DipRules {
    rules: Vec<DipRule>,
}

impl DipRules {
    pub fn new(mut rules: Vec<DipRule>) -> Result<Self, SipsimError> {
        if rules.is_empty() {
            return Err(SipsimError::invalid_parameter(
                "dip_rules",
                "at least one rule is required",
            ));
        }
        for rule in &rules {
            check_fall_pct(rule.fall_percentage)?;
            check_amount("invest_amount", rule.invest_amount)?;
        }

        rules.sort_by(|a, b| a.fall_percentage.total_cmp(&b.fall_percentage));
        if let Some(pair) = rules
            .windows(2)
            .find(|w| w[0].fall_percentage == w[1].fall_percentage)
        {
            return Err(SipsimError::invalid_parameter(
                "dip_rules",
                format!("duplicate threshold {}%", pair[0].fall_percentage),
            ));
        }

        Ok(Self { rules })
    }

    /// The rule with the largest threshold not exceeding `fall_pct`.
    ///
    /// Rules do not stack: a 12% fall against {5%, 10%} selects only the 10% rule.
    pub fn select(&self, fall_pct: f64) -> Option<&DipRule> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.fall_percentage <= fall_pct)
    }

    /// The next rule above `rule`'s threshold, if any.
    pub fn next_above(&self, rule: &DipRule) -> Option<&DipRule> {
        self.rules
            .iter()
            .find(|r| r.fall_percentage > rule.fall_percentage)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DipRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for DipRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.rules.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Parses `"5:5000, 10:10000"` (threshold percent, then amount).
impl FromStr for DipRules {
    type Err = SipsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rules = Vec::new();
        for token in s.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (pct, amount) = token.split_once(':').ok_or_else(|| {
                SipsimError::invalid_parameter(
                    "dip_rules",
                    format!("expected <percent>:<amount>, got '{token}'"),
                )
            })?;
            let pct: f64 = pct.trim().trim_end_matches('%').parse().map_err(|_| {
                SipsimError::invalid_parameter("dip_rules", format!("invalid percentage in '{token}'"))
            })?;
            let amount: f64 = amount.trim().parse().map_err(|_| {
                SipsimError::invalid_parameter("dip_rules", format!("invalid amount in '{token}'"))
            })?;
            rules.push(DipRule::new(pct, amount));
        }
        DipRules::new(rules)
    }
}

/// Monthly `base_amount` on the 1st plus dip purchases per `rules`.
pub fn simulate(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    base_amount: f64,
    rules: &DipRules,
    lookback_days: u32,
) -> Result<Ledger, SipsimError> {
    check_range(start, end)?;
    check_amount("base_amount", base_amount)?;
    check_lookback(lookback_days)?;

    let scheduled = periodic::simulate(oracle, start, end, base_amount, BASE_DAY_OF_MONTH)?;
    let consumed: HashSet<NaiveDate> = scheduled.dates().collect();

    let dips = scan_dips(oracle, start, end, rules, lookback_days, &consumed)?;
    debug!(
        scheduled = scheduled.len(),
        dips = dips.len(),
        "merging threshold ledgers"
    );

    Ok(Ledger::merge(scheduled, dips))
}

fn scan_dips(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    rules: &DipRules,
    lookback_days: u32,
    consumed: &HashSet<NaiveDate>,
) -> Result<Ledger, SipsimError> {
    let mut dips = Ledger::new();

    for point in oracle.prices_in_range(start, end)? {
        if consumed.contains(&point.date) || point.close <= 0.0 {
            continue;
        }
        let peak = match oracle.highest_price_in_window(point.date, lookback_days)? {
            Some(peak) if peak > 0.0 => peak,
            _ => continue,
        };

        let fall_pct = fall_percentage(peak, point.close);
        if let Some(rule) = rules.select(fall_pct) {
            dips.push(
                point.date,
                EventKind::Dip { fall_pct },
                rule.invest_amount,
                point.close,
            );
        }
    }

    Ok(dips)
}
