//! Strategy-versus-baseline comparison and ledger breakdowns.

use crate::domain::escalating::contributions;
use crate::domain::ledger::Ledger;
use crate::domain::returns::SimulationResult;
use chrono::{Datelike, NaiveDate};

/// Differences of a strategy run over its plain periodic baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub additional_wealth: f64,
    /// Difference in annualized return, in percentage points.
    pub annualized_return_delta_pct: f64,
    pub extra_investment: f64,
}

impl Comparison {
    pub fn between(strategy: &SimulationResult, baseline: &SimulationResult) -> Self {
        Self {
            additional_wealth: strategy.current_value - baseline.current_value,
            annualized_return_delta_pct: (strategy.annualized_return
                - baseline.annualized_return)
                * 100.0,
            extra_investment: strategy.total_invested - baseline.total_invested,
        }
    }
}

/// Dip purchases within a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DipStats {
    pub count: usize,
    pub amount: f64,
    /// Share of all invested capital that went into dips, in percent.
    pub share_pct: f64,
}

impl DipStats {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let (count, amount) = ledger
            .events()
            .iter()
            .filter(|e| e.kind.is_dip())
            .fold((0usize, 0.0_f64), |(n, sum), e| (n + 1, sum + e.amount));

        let total = ledger.total_invested();
        let share_pct = if total > 0.0 { amount / total * 100.0 } else { 0.0 };

        Self {
            count,
            amount,
            share_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearAmount {
    pub year: i32,
    pub amount: f64,
}

/// Contribution in effect for each calendar year that holds an escalating
/// event, following the same step-up rule as the simulator.
pub fn escalation_schedule(
    start: NaiveDate,
    end: NaiveDate,
    initial_amount: f64,
    annual_increase_pct: f64,
    day_of_month: u32,
) -> Vec<YearAmount> {
    let mut schedule: Vec<YearAmount> = Vec::new();
    for (date, amount) in
        contributions(start, end, initial_amount, annual_increase_pct, day_of_month)
    {
        if schedule.last().is_none_or(|entry| entry.year < date.year()) {
            schedule.push(YearAmount {
                year: date.year(),
                amount,
            });
        }
    }
    schedule
}
