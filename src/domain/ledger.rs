//! Purchase ledger shared by all strategies.
//!
//! A ledger is an ordered sequence of purchase events with running totals.
//! Events are appended in date order; [`Ledger::merge`] combines two ledgers
//! produced independently and recomputes every running total in one pass.

use chrono::NaiveDate;
use std::fmt;
use std::iter::Peekable;

/// What triggered a purchase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    Periodic,
    /// Escalating contribution; carries the amount in effect for that year.
    Escalating { amount: f64 },
    /// Drawdown purchase; carries the realized fall from the lookback peak.
    Dip { fall_pct: f64 },
}

impl EventKind {
    /// Ordering among events on the same date: scheduled contributions first.
    fn precedence(&self) -> u8 {
        match self {
            EventKind::Periodic | EventKind::Escalating { .. } => 0,
            EventKind::Dip { .. } => 1,
        }
    }

    pub fn is_dip(&self) -> bool {
        matches!(self, EventKind::Dip { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Periodic => "periodic",
            EventKind::Escalating { .. } => "escalating",
            EventKind::Dip { .. } => "dip",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Periodic => write!(f, "Periodic"),
            EventKind::Escalating { amount } => write!(f, "Escalating ({amount:.0})"),
            EventKind::Dip { fall_pct } => write!(f, "Dip ({fall_pct:.1}% fall)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseEvent {
    pub date: NaiveDate,
    pub kind: EventKind,
    pub amount: f64,
    pub price: f64,
    pub units: f64,
    pub cumulative_units: f64,
    /// `cumulative_units * price` at this event's own price.
    pub cumulative_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    events: Vec<PurchaseEvent>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a purchase of `amount` at `price`, extending the running totals.
    ///
    /// Callers append in strictly increasing date order.
    pub fn push(&mut self, date: NaiveDate, kind: EventKind, amount: f64, price: f64) {
        debug_assert!(amount > 0.0 && price > 0.0);
        debug_assert!(self.events.last().is_none_or(|last| last.date < date));

        let units = amount / price;
        let cumulative_units = self.total_units() + units;
        self.events.push(PurchaseEvent {
            date,
            kind,
            amount,
            price,
            units,
            cumulative_units,
            cumulative_value: cumulative_units * price,
        });
    }

    /// Merge two date-ordered ledgers and refold the running totals.
    ///
    /// On equal dates events from `primary` come first, and scheduled
    /// contributions precede dip purchases.
    pub fn merge(primary: Ledger, secondary: Ledger) -> Ledger {
        let merged = MergeByDate {
            left: primary.events.into_iter().peekable(),
            right: secondary.events.into_iter().peekable(),
        };

        let mut ledger = Ledger::new();
        for event in merged {
            ledger.push(event.date, event.kind, event.amount, event.price);
        }
        ledger
    }

    pub fn events(&self) -> &[PurchaseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<&PurchaseEvent> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&PurchaseEvent> {
        self.events.last()
    }

    pub fn total_invested(&self) -> f64 {
        self.events.iter().map(|e| e.amount).sum()
    }

    pub fn total_units(&self) -> f64 {
        self.events.last().map(|e| e.cumulative_units).unwrap_or(0.0)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.events.iter().map(|e| e.date)
    }
}

struct MergeByDate<L: Iterator<Item = PurchaseEvent>, R: Iterator<Item = PurchaseEvent>> {
    left: Peekable<L>,
    right: Peekable<R>,
}

impl<L, R> Iterator for MergeByDate<L, R>
where
    L: Iterator<Item = PurchaseEvent>,
    R: Iterator<Item = PurchaseEvent>,
{
    type Item = PurchaseEvent;

    fn next(&mut self) -> Option<PurchaseEvent> {
        let take_left = match (self.left.peek(), self.right.peek()) {
            (Some(l), Some(r)) => {
                (l.date, l.kind.precedence()) <= (r.date, r.kind.precedence())
            }
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };
        if take_left {
            self.left.next()
        } else {
            self.right.next()
        }
    }
}
