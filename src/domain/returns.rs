//! Ledger aggregation and return estimates.
//!
//! `annualized_return` is a single-rate approximation: it treats all capital as
//! if invested at the first event and compounds over the ledger's span. It is
//! exact only for a lump-sum investment and ignores when intermediate
//! contributions arrived. [`money_weighted_return`] solves the cash-flow
//! schedule exactly and is reported separately.

use crate::domain::ledger::Ledger;
use chrono::NaiveDate;

pub const DAYS_PER_YEAR: f64 = 365.25;

const IRR_LOWER_BOUND: f64 = -0.9999;
const IRR_MAX_UPPER_BOUND: f64 = 1.0e6;
const IRR_TOLERANCE: f64 = 1.0e-10;
const IRR_MAX_ITERATIONS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub total_invested: f64,
    /// Units held, marked at the current price.
    pub current_value: f64,
    pub total_returns: f64,
    pub total_units: f64,
    /// `None` when no units are held.
    pub average_price: Option<f64>,
    pub annualized_return: f64,
    pub ledger: Ledger,
}

/// Fold a ledger into summary metrics, marking holdings at `current_price`.
pub fn summarize(ledger: Ledger, current_price: f64) -> SimulationResult {
    let total_invested = ledger.total_invested();
    let total_units = ledger.total_units();
    let current_value = total_units * current_price;

    let average_price = if total_units > 0.0 {
        Some(total_invested / total_units)
    } else {
        None
    };

    let annualized_return = approximate_annualized_return(&ledger, total_invested, current_value);

    SimulationResult {
        total_invested,
        current_value,
        total_returns: current_value - total_invested,
        total_units,
        average_price,
        annualized_return,
        ledger,
    }
}

/// `(current_value / total_invested) ^ (1 / years) - 1` over the ledger span.
fn approximate_annualized_return(ledger: &Ledger, total_invested: f64, current_value: f64) -> f64 {
    let (first, last) = match (ledger.first(), ledger.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return 0.0,
    };

    let years = years_between(first, last);
    if years <= 0.0 || total_invested <= 0.0 {
        return 0.0;
    }

    (current_value / total_invested).powf(1.0 / years) - 1.0
}

fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Annual rate `r` at which every purchase, compounded to `valuation_date`,
/// adds up to `current_value` (XIRR).
///
/// Returns `None` for an empty ledger, a valuation date before the first
/// purchase, a zero-length schedule, or when no rate brackets a solution.
pub fn money_weighted_return(
    ledger: &Ledger,
    current_value: f64,
    valuation_date: NaiveDate,
) -> Option<f64> {
    let origin = ledger.first()?.date;
    if valuation_date < origin || !current_value.is_finite() || current_value <= 0.0 {
        return None;
    }
    let horizon = years_between(origin, valuation_date);
    if horizon <= 0.0 {
        return None;
    }

    let mut flows: Vec<(f64, f64)> = ledger
        .events()
        .iter()
        .map(|e| (years_between(origin, e.date), -e.amount))
        .collect();
    flows.push((horizon, current_value));

    let npv = |rate: f64| -> f64 {
        flows
            .iter()
            .map(|&(t, amount)| amount / (1.0 + rate).powf(t))
            .sum()
    };

    let mut lo = IRR_LOWER_BOUND;
    let mut hi = 1.0;
    let npv_lo = npv(lo);
    let mut npv_hi = npv(hi);
    while npv_lo.signum() == npv_hi.signum() {
        if hi >= IRR_MAX_UPPER_BOUND {
            return None;
        }
        hi *= 2.0;
        npv_hi = npv(hi);
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let npv_mid = npv(mid);
        if npv_mid == 0.0 || (hi - lo) / 2.0 < IRR_TOLERANCE {
            return Some(mid);
        }
        if npv_mid.signum() == npv_lo.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some((lo + hi) / 2.0)
}
