//! Parameter bound checks shared by the simulators and strategy configs.

use crate::domain::error::SipsimError;
use chrono::NaiveDate;

pub const MIN_DAY_OF_MONTH: u32 = 1;
/// Highest day that exists in every month.
pub const MAX_DAY_OF_MONTH: u32 = 28;
pub const MAX_ANNUAL_INCREASE_PCT: f64 = 50.0;
pub const MAX_FALL_PCT: f64 = 50.0;
pub const MIN_LOOKBACK_DAYS: u32 = 7;
pub const MAX_LOOKBACK_DAYS: u32 = 365;

pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), SipsimError> {
    if start >= end {
        return Err(SipsimError::invalid_range(format!(
            "start date {start} must be before end date {end}"
        )));
    }
    Ok(())
}

pub fn check_amount(name: &str, value: f64) -> Result<(), SipsimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SipsimError::invalid_parameter(
            name,
            format!("must be a positive amount, got {value}"),
        ));
    }
    Ok(())
}

pub fn check_day_of_month(day: u32) -> Result<(), SipsimError> {
    if !(MIN_DAY_OF_MONTH..=MAX_DAY_OF_MONTH).contains(&day) {
        return Err(SipsimError::invalid_parameter(
            "day_of_month",
            format!("must be between {MIN_DAY_OF_MONTH} and {MAX_DAY_OF_MONTH}, got {day}"),
        ));
    }
    Ok(())
}

pub fn check_increase_pct(pct: f64) -> Result<(), SipsimError> {
    if !pct.is_finite() || !(0.0..=MAX_ANNUAL_INCREASE_PCT).contains(&pct) {
        return Err(SipsimError::invalid_parameter(
            "annual_increase_pct",
            format!("must be between 0 and {MAX_ANNUAL_INCREASE_PCT}, got {pct}"),
        ));
    }
    Ok(())
}

pub fn check_fall_pct(pct: f64) -> Result<(), SipsimError> {
    if !pct.is_finite() || pct <= 0.0 || pct > MAX_FALL_PCT {
        return Err(SipsimError::invalid_parameter(
            "fall_percentage",
            format!("must be in (0, {MAX_FALL_PCT}], got {pct}"),
        ));
    }
    Ok(())
}

pub fn check_lookback(days: u32) -> Result<(), SipsimError> {
    if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(SipsimError::invalid_parameter(
            "lookback_days",
            format!("must be between {MIN_LOOKBACK_DAYS} and {MAX_LOOKBACK_DAYS}, got {days}"),
        ));
    }
    Ok(())
}

/// A price returned by a price source must be usable as a divisor.
pub fn check_price(date: NaiveDate, price: f64) -> Result<f64, SipsimError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(SipsimError::invalid_parameter(
            "price",
            format!("close on {date} must be positive, got {price}"),
        ));
    }
    Ok(price)
}
