//! SQLite price store.

use crate::domain::bounds::check_price;
use crate::domain::error::SipsimError;
use crate::domain::price::{PriceLookup, PricePoint};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceOracle;
use chrono::{Duration, NaiveDate};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    lookup: PriceLookup,
}

impl SqliteAdapter {
    /// Opens `[sqlite] path`, falling back to `[prices] path`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SipsimError> {
        let db_path = config
            .get_string("sqlite", "path")
            .or_else(|| config.get_string("prices", "path"))
            .ok_or_else(|| SipsimError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let lookup = match config.get_string("prices", "lookup") {
            Some(raw) => raw
                .parse::<PriceLookup>()
                .map_err(|reason| SipsimError::ConfigInvalid {
                    section: "prices".into(),
                    key: "lookup".into(),
                    reason,
                })?,
            None => PriceLookup::default(),
        };

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| SipsimError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool, lookup })
    }

    pub fn in_memory() -> Result<Self, SipsimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SipsimError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            pool,
            lookup: PriceLookup::default(),
        })
    }

    pub fn with_lookup(mut self, lookup: PriceLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn initialize_schema(&self) -> Result<(), SipsimError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                date TEXT PRIMARY KEY,
                close REAL NOT NULL
            );",
        )
        .map_err(query_error)?;
        Ok(())
    }

    /// Insert or replace closes in one transaction. Non-positive closes are
    /// rejected before anything is written.
    pub fn insert_prices(&self, points: &[PricePoint]) -> Result<(), SipsimError> {
        for point in points {
            check_price(point.date, point.close)?;
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(query_error)?;
        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO prices (date, close) VALUES (?1, ?2)",
                params![point.date.format(DATE_FORMAT).to_string(), point.close],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)?;
        Ok(())
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, SipsimError> {
        self.pool.get().map_err(|e: r2d2::Error| SipsimError::Database {
            reason: e.to_string(),
        })
    }
}

fn query_error(e: rusqlite::Error) -> SipsimError {
    SipsimError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, SipsimError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e: chrono::ParseError| {
        SipsimError::Database {
            reason: format!("invalid stored date '{value}': {e}"),
        }
    })
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl PriceOracle for SqliteAdapter {
    fn price_on(&self, date: NaiveDate) -> Result<f64, SipsimError> {
        let conn = self.connection()?;
        let query = match self.lookup {
            PriceLookup::Exact => "SELECT close FROM prices WHERE date = ?1",
            PriceLookup::Previous => {
                "SELECT close FROM prices WHERE date <= ?1 ORDER BY date DESC LIMIT 1"
            }
        };
        let close: Option<f64> = conn
            .query_row(query, params![fmt_date(date)], |row| row.get(0))
            .optional()
            .map_err(query_error)?;
        close.ok_or(SipsimError::PriceUnavailable { date })
    }

    fn prices_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, SipsimError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, close FROM prices
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![fmt_date(start), fmt_date(end)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })
            .map_err(query_error)?;

        let mut points = Vec::new();
        for row in rows {
            let (date_str, close) = row.map_err(query_error)?;
            points.push(PricePoint::new(parse_date(&date_str)?, close));
        }
        Ok(points)
    }

    fn highest_price_in_window(
        &self,
        date: NaiveDate,
        lookback_days: u32,
    ) -> Result<Option<f64>, SipsimError> {
        let conn = self.connection()?;
        let from = date - Duration::days(i64::from(lookback_days));
        conn.query_row(
            "SELECT MAX(close) FROM prices WHERE date >= ?1 AND date < ?2",
            params![fmt_date(from), fmt_date(date)],
            |row| row.get(0),
        )
        .map_err(query_error)
    }

    fn current_price(&self) -> Result<f64, SipsimError> {
        let conn = self.connection()?;
        let close: Option<f64> = conn
            .query_row(
                "SELECT close FROM prices ORDER BY date DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;
        close.ok_or_else(|| SipsimError::invalid_range("price table is empty"))
    }

    fn available_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SipsimError> {
        let conn = self.connection()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row("SELECT MIN(date), MAX(date), COUNT(*) FROM prices", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_date(&min_str)?,
                parse_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
