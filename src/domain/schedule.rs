//! Monthly contribution calendar.

use chrono::{Datelike, Months, NaiveDate};

/// Monthly anchor dates on `day_of_month`, within `[start, end]`.
///
/// The first anchor is `day_of_month` in `start`'s month; it is skipped when it
/// falls before `start`. Each step produces a fresh date one calendar month
/// later, so dates already handed out never change. `day_of_month` must be in
/// 1..=28; an invalid day yields no anchors.
pub fn monthly_anchors(
    start: NaiveDate,
    end: NaiveDate,
    day_of_month: u32,
) -> impl Iterator<Item = NaiveDate> {
    let first = NaiveDate::from_ymd_opt(start.year(), start.month(), day_of_month);
    std::iter::successors(first, |date| date.checked_add_months(Months::new(1)))
        .take_while(move |date| *date <= end)
        .filter(move |date| *date >= start)
}
