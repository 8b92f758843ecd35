#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sipsim::adapters::memory_adapter::PriceSeries;
use sipsim::domain::error::SipsimError;
pub use sipsim::domain::price::PricePoint;
use sipsim::ports::price_port::PriceOracle;
use std::cell::Cell;
use std::collections::HashSet;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One close per calendar day starting at `start`.
pub fn daily_points(start: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + Duration::days(i as i64), close))
        .collect()
}

pub fn flat_series(start: NaiveDate, days: usize, close: f64) -> PriceSeries {
    PriceSeries::new(daily_points(start, &vec![close; days])).unwrap()
}

pub fn series(start: NaiveDate, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(daily_points(start, closes)).unwrap()
}

/// Price source wrapper that can hide dates and counts lookups.
pub struct MockPriceOracle {
    pub inner: PriceSeries,
    pub missing: HashSet<NaiveDate>,
    pub lookups: Cell<usize>,
}

impl MockPriceOracle {
    pub fn new(inner: PriceSeries) -> Self {
        Self {
            inner,
            missing: HashSet::new(),
            lookups: Cell::new(0),
        }
    }

    pub fn without(mut self, date: NaiveDate) -> Self {
        self.missing.insert(date);
        self
    }
}

impl PriceOracle for MockPriceOracle {
    fn price_on(&self, date: NaiveDate) -> Result<f64, SipsimError> {
        self.lookups.set(self.lookups.get() + 1);
        if self.missing.contains(&date) {
            return Err(SipsimError::PriceUnavailable { date });
        }
        self.inner.price_on(date)
    }

    fn prices_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, SipsimError> {
        Ok(self
            .inner
            .prices_in_range(start, end)?
            .into_iter()
            .filter(|p| !self.missing.contains(&p.date))
            .collect())
    }

    fn highest_price_in_window(
        &self,
        date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Option<f64>, SipsimError> {
        self.inner.highest_price_in_window(date, lookback_days)
    }

    fn current_price(&self) -> Result<f64, SipsimError> {
        self.inner.current_price()
    }

    fn available_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SipsimError> {
        self.inner.available_range()
    }
}
