//! In-memory price series.
//!
//! Backs the CSV loader and the tests. Lookups are `BTreeMap` range queries,
//! so the lookback window maximum costs one scan of the window.

use crate::domain::error::SipsimError;
use crate::domain::price::{PriceLookup, PricePoint};
use crate::ports::price_port::PriceOracle;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    closes: BTreeMap<NaiveDate, f64>,
    lookup: PriceLookup,
}

impl PriceSeries {
    /// Build from points in strictly increasing date order with positive closes.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SipsimError> {
        let mut closes = BTreeMap::new();
        let mut previous: Option<NaiveDate> = None;

        for point in points {
            if let Some(prev) = previous {
                if point.date <= prev {
                    return Err(SipsimError::invalid_parameter(
                        "price series",
                        format!("dates must be strictly increasing ({} after {})", point.date, prev),
                    ));
                }
            }
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(SipsimError::invalid_parameter(
                    "price series",
                    format!("close on {} must be positive, got {}", point.date, point.close),
                ));
            }
            closes.insert(point.date, point.close);
            previous = Some(point.date);
        }

        Ok(Self {
            closes,
            lookup: PriceLookup::Exact,
        })
    }

    pub fn with_lookup(mut self, lookup: PriceLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

impl PriceOracle for PriceSeries {
    fn price_on(&self, date: NaiveDate) -> Result<f64, SipsimError> {
        let found = match self.lookup {
            PriceLookup::Exact => self.closes.get(&date).copied(),
            PriceLookup::Previous => self.closes.range(..=date).next_back().map(|(_, &c)| c),
        };
        found.ok_or(SipsimError::PriceUnavailable { date })
    }

    fn prices_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, SipsimError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self
            .closes
            .range(start..=end)
            .map(|(&date, &close)| PricePoint { date, close })
            .collect())
    }

    fn highest_price_in_window(
        &self,
        date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Option<f64>, SipsimError> {
        let from = date - Duration::days(i64::from(lookback_days));
        Ok(self
            .closes
            .range(from..date)
            .map(|(_, &close)| close)
            .reduce(f64::max))
    }

    fn current_price(&self) -> Result<f64, SipsimError> {
        match self.closes.last_key_value() {
            Some((_, &close)) => Ok(close),
            None => Err(SipsimError::invalid_range("price series is empty")),
        }
    }

    fn available_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SipsimError> {
        Ok(match (self.closes.first_key_value(), self.closes.last_key_value()) {
            (Some((&first, _)), Some((&last, _))) => Some((first, last, self.closes.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::new(vec![
            PricePoint::new(d(2024, 1, 1), 100.0),
            PricePoint::new(d(2024, 1, 2), 110.0),
            PricePoint::new(d(2024, 1, 5), 105.0),
            PricePoint::new(d(2024, 1, 8), 90.0),
        ])
        .unwrap()
    }

    #[test]
    fn price_on_exact_date() {
        let series = sample_series();
        assert_eq!(series.price_on(d(2024, 1, 2)).unwrap(), 110.0);
    }

    #[test]
    fn price_on_missing_date_fails() {
        let series = sample_series();
        let err = series.price_on(d(2024, 1, 3)).unwrap_err();
        assert!(matches!(err, SipsimError::PriceUnavailable { date } if date == d(2024, 1, 3)));
    }

    #[test]
    fn previous_lookup_uses_last_close_before() {
        let series = sample_series().with_lookup(PriceLookup::Previous);
        assert_eq!(series.price_on(d(2024, 1, 4)).unwrap(), 110.0);
        assert!(series.price_on(d(2023, 12, 31)).is_err());
    }

    #[test]
    fn range_is_inclusive() {
        let series = sample_series();
        let points = series.prices_in_range(d(2024, 1, 2), d(2024, 1, 8)).unwrap();
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 5), d(2024, 1, 8)]);
    }

    #[test]
    fn window_excludes_the_date_itself() {
        let series = sample_series();
        // [2024-01-01, 2024-01-08) holds 100, 110, 105.
        assert_eq!(
            series.highest_price_in_window(d(2024, 1, 8), 7).unwrap(),
            Some(110.0)
        );
        // [2024-01-04, 2024-01-08) holds only 105.
        assert_eq!(
            series.highest_price_in_window(d(2024, 1, 8), 4).unwrap(),
            Some(105.0)
        );
        assert_eq!(series.highest_price_in_window(d(2024, 1, 1), 30).unwrap(), None);
    }

    #[test]
    fn current_price_is_latest_close() {
        assert_eq!(sample_series().current_price().unwrap(), 90.0);
    }

    #[test]
    fn available_range_reports_bounds() {
        assert_eq!(
            sample_series().available_range().unwrap(),
            Some((d(2024, 1, 1), d(2024, 1, 8), 4))
        );
        assert_eq!(PriceSeries::default().available_range().unwrap(), None);
    }

    #[test]
    fn rejects_unordered_dates() {
        let result = PriceSeries::new(vec![
            PricePoint::new(d(2024, 1, 2), 100.0),
            PricePoint::new(d(2024, 1, 1), 100.0),
        ]);
        assert!(matches!(result, Err(SipsimError::InvalidParameter { .. })));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let result = PriceSeries::new(vec![
            PricePoint::new(d(2024, 1, 1), 100.0),
            PricePoint::new(d(2024, 1, 1), 101.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_positive_close() {
        let result = PriceSeries::new(vec![PricePoint::new(d(2024, 1, 1), 0.0)]);
        assert!(result.is_err());
    }
}
