//! CSV price files and ledger export.
//!
//! Price files need a header row with `date` and `close` columns; any other
//! columns (open, high, low, volume) are ignored, so exported OHLCV files load
//! unchanged. Rows may appear in any order.

use crate::adapters::memory_adapter::PriceSeries;
use crate::domain::error::SipsimError;
use crate::domain::ledger::Ledger;
use crate::domain::price::{PriceLookup, PricePoint};
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub fn load_prices(path: &Path, lookup: PriceLookup) -> Result<PriceSeries, SipsimError> {
    let content = fs::read_to_string(path).map_err(|e| SipsimError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    let series = parse_prices(&content)?.with_lookup(lookup);
    debug!(path = %path.display(), points = series.len(), "loaded price file");
    Ok(series)
}

pub fn parse_prices(content: &str) -> Result<PriceSeries, SipsimError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());

    let headers = rdr.headers().map_err(|e| SipsimError::Database {
        reason: format!("CSV header error: {}", e),
    })?;
    let date_col = column(headers, "date")?;
    let close_col = column(headers, "close")?;

    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| SipsimError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;

        let date_str = record.get(date_col).ok_or_else(|| SipsimError::Database {
            reason: "missing date column".into(),
        })?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            SipsimError::Database {
                reason: format!("invalid date '{}': {}", date_str, e),
            }
        })?;

        let close: f64 = record
            .get(close_col)
            .ok_or_else(|| SipsimError::Database {
                reason: "missing close column".into(),
            })?
            .trim()
            .parse()
            .map_err(|e| SipsimError::Database {
                reason: format!("invalid close value on {}: {}", date, e),
            })?;

        points.push(PricePoint::new(date, close));
    }

    points.sort_by_key(|p| p.date);
    PriceSeries::new(points)
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, SipsimError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| SipsimError::Database {
            reason: format!("CSV has no '{}' column", name),
        })
}

/// Write one row per purchase event.
pub fn write_ledger<W: Write>(writer: W, ledger: &Ledger) -> Result<(), SipsimError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "date",
        "kind",
        "trigger",
        "amount",
        "price",
        "units",
        "cumulative_units",
        "cumulative_value",
    ])
    .map_err(csv_io)?;

    for event in ledger.events() {
        wtr.write_record([
            event.date.format("%Y-%m-%d").to_string(),
            event.kind.label().to_string(),
            event.kind.to_string(),
            format!("{:.2}", event.amount),
            format!("{:.4}", event.price),
            format!("{:.6}", event.units),
            format!("{:.6}", event.cumulative_units),
            format!("{:.2}", event.cumulative_value),
        ])
        .map_err(csv_io)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_ledger_file(path: &Path, ledger: &Ledger) -> Result<(), SipsimError> {
    let file = fs::File::create(path)?;
    write_ledger(file, ledger)
}

fn csv_io(err: csv::Error) -> SipsimError {
    SipsimError::Io(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::EventKind;
    use crate::ports::price_port::PriceOracle;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_ohlcv_file_by_header_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("NIFTYBEES.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n",
        )
        .unwrap();

        let series = load_prices(&path, PriceLookup::Exact).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.price_on(d(2024, 1, 16)).unwrap(), 110.0);
        assert_eq!(series.current_price().unwrap(), 115.0);
    }

    #[test]
    fn unordered_rows_are_sorted() {
        let series = parse_prices("close,date\n12.5,2024-03-02\n10.0,2024-03-01\n").unwrap();
        let points = series.prices_in_range(d(2024, 3, 1), d(2024, 3, 2)).unwrap();
        assert_eq!(points[0].date, d(2024, 3, 1));
        assert_eq!(points[1].close, 12.5);
    }

    #[test]
    fn lookup_policy_is_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.csv");
        fs::write(&path, "date,close\n2024-03-01,10.0\n2024-03-04,11.0\n").unwrap();

        let series = load_prices(&path, PriceLookup::Previous).unwrap();
        assert_eq!(series.price_on(d(2024, 3, 3)).unwrap(), 10.0);
    }

    #[test]
    fn duplicate_dates_rejected() {
        let result = parse_prices("date,close\n2024-03-01,10.0\n2024-03-01,11.0\n");
        assert!(matches!(result, Err(SipsimError::InvalidParameter { .. })));
    }

    #[test]
    fn missing_close_column_fails() {
        let result = parse_prices("date,open\n2024-03-01,10.0\n");
        assert!(matches!(result, Err(SipsimError::Database { .. })));
    }

    #[test]
    fn bad_close_value_fails() {
        let result = parse_prices("date,close\n2024-03-01,n/a\n");
        assert!(matches!(result, Err(SipsimError::Database { .. })));
    }

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = load_prices(&dir.path().join("absent.csv"), PriceLookup::Exact);
        assert!(result.is_err());
    }

    #[test]
    fn ledger_written_with_header() {
        let mut ledger = Ledger::new();
        ledger.push(d(2024, 1, 1), EventKind::Periodic, 1000.0, 100.0);
        ledger.push(d(2024, 1, 9), EventKind::Dip { fall_pct: 6.0 }, 500.0, 94.0);

        let mut out = Vec::new();
        write_ledger(&mut out, &ledger).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,kind,trigger,amount"));
        assert!(lines[1].starts_with("2024-01-01,periodic,Periodic,1000.00,100.0000,10.000000"));
        assert!(lines[2].starts_with("2024-01-09,dip,Dip (6.0% fall),500.00"));
    }

    #[test]
    fn ledger_file_round_trips_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = Ledger::new();
        ledger.push(d(2024, 1, 1), EventKind::Periodic, 1000.0, 100.0);

        write_ledger_file(&path, &ledger).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("2024-01-01"));
    }
}
