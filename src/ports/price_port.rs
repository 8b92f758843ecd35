//! Price history access port trait.

use crate::domain::error::SipsimError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

/// Read-only view of a single instrument's daily close series.
///
/// Simulators never mutate the series; every method takes `&self` so one
/// oracle can back several simulations running at the same time.
pub trait PriceOracle {
    /// Close on `date`. Fails with `PriceUnavailable` when none is recorded.
    fn price_on(&self, date: NaiveDate) -> Result<f64, SipsimError>;

    /// All points in `[start, end]`, ascending by date.
    fn prices_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, SipsimError>;

    /// Highest close over `[date - lookback_days, date)`, or `None` if the
    /// window contains no prices.
    fn highest_price_in_window(
        &self,
        date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Option<f64>, SipsimError>;

    /// Latest known close, used only for marking current value.
    fn current_price(&self) -> Result<f64, SipsimError>;

    /// First date, last date and number of points, or `None` if empty.
    fn available_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SipsimError>;
}
