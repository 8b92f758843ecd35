//! Daily close price representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// How a price source answers a query for a date it has no close for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceLookup {
    /// Only the close recorded on that exact date.
    #[default]
    Exact,
    /// Most recent close on or before the date.
    Previous,
}

impl std::str::FromStr for PriceLookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(PriceLookup::Exact),
            "previous" | "prev" | "asof" | "as-of" => Ok(PriceLookup::Previous),
            other => Err(format!("unknown price lookup '{other}' (expected exact or previous)")),
        }
    }
}

/// Percentage drop of `price` below `peak`.
pub fn fall_percentage(peak: f64, price: f64) -> f64 {
    (peak - price) / peak * 100.0
}
