//! Monthly investing with an annual step-up of the contribution.

use crate::domain::bounds::{
    check_amount, check_day_of_month, check_increase_pct, check_price, check_range,
};
use crate::domain::error::SipsimError;
use crate::domain::ledger::{EventKind, Ledger};
use crate::domain::schedule::monthly_anchors;
use crate::ports::price_port::PriceOracle;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Same cadence as periodic investing, but the contribution compounds by
/// `annual_increase_pct` at the first event of each new calendar year.
///
/// The step-up is applied before that event is recorded. The very first event
/// always uses `initial_amount`.
pub fn simulate(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    initial_amount: f64,
    annual_increase_pct: f64,
    day_of_month: u32,
) -> Result<Ledger, SipsimError> {
    check_range(start, end)?;
    check_amount("initial_amount", initial_amount)?;
    check_increase_pct(annual_increase_pct)?;
    check_day_of_month(day_of_month)?;

    let schedule = contributions(start, end, initial_amount, annual_increase_pct, day_of_month);
    let mut ledger = Ledger::new();
    for (date, amount) in schedule {
        let price = check_price(date, oracle.price_on(date)?)?;
        ledger.push(date, EventKind::Escalating { amount }, amount, price);
    }

    debug!(events = ledger.len(), %start, %end, "escalating ledger generated");
    Ok(ledger)
}

/// Anchor dates paired with the contribution in effect on each.
///
/// The amount compounds when an anchor's year is later than the previous
/// anchor's year, so the first anchor always carries `initial_amount`.
pub fn contributions(
    start: NaiveDate,
    end: NaiveDate,
    initial_amount: f64,
    annual_increase_pct: f64,
    day_of_month: u32,
) -> impl Iterator<Item = (NaiveDate, f64)> {
    let growth = 1.0 + annual_increase_pct / 100.0;
    monthly_anchors(start, end, day_of_month).scan(
        (initial_amount, None::<i32>),
        move |(amount, last_year), date| {
            if last_year.is_some_and(|year| date.year() > year) {
                *amount *= growth;
                debug!(year = date.year(), amount = *amount, "contribution stepped up");
            }
            *last_year = Some(date.year());
            Some((date, *amount))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_adapter::PriceSeries;
    use crate::domain::price::PricePoint;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_series(start: NaiveDate, days: i64) -> PriceSeries {
        let points = (0..days)
            .map(|i| PricePoint::new(start + Duration::days(i), 100.0))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn two_boundaries_compound() {
        let series = flat_series(d(2020, 1, 1), 3 * 366);
        let ledger =
            simulate(&series, d(2020, 1, 1), d(2022, 12, 31), 10_000.0, 10.0, 1).unwrap();

        assert_eq!(ledger.len(), 36);
        let last = ledger.last().unwrap();
        assert!((last.amount - 12_100.0).abs() < 1e-6);
        assert!(matches!(last.kind, EventKind::Escalating { amount } if (amount - 12_100.0).abs() < 1e-6));
    }

    #[test]
    fn amount_constant_within_year() {
        let series = flat_series(d(2020, 1, 1), 4 * 366);
        let ledger =
            simulate(&series, d(2020, 3, 1), d(2023, 8, 31), 5_000.0, 7.5, 15).unwrap();

        let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for event in ledger.events() {
            by_year.entry(event.date.year()).or_default().push(event.amount);
        }
        for amounts in by_year.values() {
            assert!(amounts.iter().all(|a| (a - amounts[0]).abs() < 1e-9));
        }

        let yearly: Vec<f64> = by_year.values().map(|a| a[0]).collect();
        for pair in yearly.windows(2) {
            assert!((pair[1] - pair[0] * 1.075).abs() < 1e-6);
        }
    }

    #[test]
    fn mid_year_start_steps_up_next_january() {
        let series = flat_series(d(2020, 1, 1), 2 * 366);
        let ledger =
            simulate(&series, d(2020, 11, 1), d(2021, 2, 28), 1_000.0, 20.0, 1).unwrap();
        let amounts: Vec<f64> = ledger.events().iter().map(|e| e.amount).collect();
        assert_eq!(amounts.len(), 4);
        assert!((amounts[0] - 1_000.0).abs() < 1e-9);
        assert!((amounts[1] - 1_000.0).abs() < 1e-9);
        assert!((amounts[2] - 1_200.0).abs() < 1e-9);
        assert!((amounts[3] - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn zero_increase_matches_periodic() {
        let series = flat_series(d(2020, 1, 1), 3 * 366);
        let escalating =
            simulate(&series, d(2020, 1, 1), d(2022, 6, 30), 2_000.0, 0.0, 5).unwrap();
        let periodic = crate::domain::periodic::simulate(
            &series,
            d(2020, 1, 1),
            d(2022, 6, 30),
            2_000.0,
            5,
        )
        .unwrap();

        assert_eq!(escalating.len(), periodic.len());
        for (a, b) in escalating.events().iter().zip(periodic.events()) {
            assert_eq!(a.date, b.date);
            assert_eq!(a.amount, b.amount);
            assert_eq!(a.cumulative_units, b.cumulative_units);
        }
    }

    #[test]
    fn rejects_out_of_bounds_increase() {
        let series = flat_series(d(2020, 1, 1), 400);
        let err =
            simulate(&series, d(2020, 1, 1), d(2020, 12, 31), 1_000.0, 60.0, 1).unwrap_err();
        assert!(matches!(err, SipsimError::InvalidParameter { name, .. } if name == "annual_increase_pct"));
    }

    #[test]
    fn contributions_follow_anchor_years() {
        let amounts: Vec<(NaiveDate, f64)> =
            contributions(d(2020, 12, 20), d(2021, 3, 31), 1_000.0, 10.0, 1).collect();
        assert_eq!(
            amounts,
            vec![
                (d(2021, 1, 1), 1_000.0),
                (d(2021, 2, 1), 1_000.0),
                (d(2021, 3, 1), 1_000.0),
            ]
        );
    }
}
