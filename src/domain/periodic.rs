//! Fixed-amount monthly investing.

use crate::domain::bounds::{check_amount, check_day_of_month, check_price, check_range};
use crate::domain::error::SipsimError;
use crate::domain::ledger::{EventKind, Ledger};
use crate::domain::schedule::monthly_anchors;
use crate::ports::price_port::PriceOracle;
use chrono::NaiveDate;
use tracing::debug;

/// Invest `amount` on `day_of_month` of every month in `[start, end]`.
///
/// A missing price on any anchor date fails the whole run; no partial ledger
/// is returned.
pub fn simulate(
    oracle: &dyn PriceOracle,
    start: NaiveDate,
    end: NaiveDate,
    amount: f64,
    day_of_month: u32,
) -> Result<Ledger, SipsimError> {
    check_range(start, end)?;
    check_amount("amount", amount)?;
    check_day_of_month(day_of_month)?;

    let mut ledger = Ledger::new();
    for date in monthly_anchors(start, end, day_of_month) {
        let price = check_price(date, oracle.price_on(date)?)?;
        ledger.push(date, EventKind::Periodic, amount, price);
    }

    debug!(events = ledger.len(), %start, %end, "periodic ledger generated");
    Ok(ledger)
}
