//! SQLite-backed return and factor store.

use crate::error::{DataError, Result};
use crate::schema::{self, FactorObservation, ReturnObservation};
use crate::store::{FactorStore, ReturnStore};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use rusqlite::{Connection, params};
use std::path::Path;

/// SQLite store for daily security returns and daily factor returns.
///
/// Dates are stored as ISO-8601 TEXT so the on-disk order matches the
/// chronological order used everywhere else.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS security_returns (
                security TEXT NOT NULL,
                date TEXT NOT NULL,
                ret REAL NOT NULL,
                PRIMARY KEY (security, date)
            );
            CREATE TABLE IF NOT EXISTS daily_factors (
                date TEXT PRIMARY KEY,
                mkt REAL NOT NULL,
                smb REAL NOT NULL,
                hml REAL NOT NULL,
                umd REAL NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Store return observations, replacing existing rows for the same
    /// `(security, date)`.
    pub fn put_returns(&self, observations: &[ReturnObservation]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO security_returns (security, date, ret)
                 VALUES (?1, ?2, ?3)",
            )?;
            for observation in observations {
                stmt.execute(params![
                    observation.security,
                    observation.date.to_string(),
                    observation.ret,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Store factor observations, replacing existing rows for the same date.
    pub fn put_factors(&self, observations: &[FactorObservation]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO daily_factors (date, mkt, smb, hml, umd)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for observation in observations {
                stmt.execute(params![
                    observation.date.to_string(),
                    observation.mkt,
                    observation.smb,
                    observation.hml,
                    observation.umd,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    text.parse()
        .map_err(|_| DataError::Parse(format!("Invalid date: {text}")))
}

/// Build the `?, ?, …` placeholder list for an `IN` clause.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl ReturnStore for SqliteStore {
    fn security_returns(&self, security: &str, dates: &[NaiveDate]) -> Result<DataFrame> {
        if dates.is_empty() {
            return schema::returns_frame(&[]);
        }

        let sql = format!(
            "SELECT security, date, ret FROM security_returns
             WHERE security = ? AND date IN ({})
             ORDER BY date",
            placeholders(dates.len())
        );

        let mut args: Vec<String> = Vec::with_capacity(dates.len() + 1);
        args.push(security.to_string());
        args.extend(dates.iter().map(ToString::to_string));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut observations = Vec::new();
        for row in rows {
            let (security, date, ret) = row?;
            observations.push(ReturnObservation {
                security,
                date: parse_date(&date)?,
                ret,
            });
        }

        schema::returns_frame(&observations)
    }
}

impl FactorStore for SqliteStore {
    fn factor_returns(&self, dates: &[NaiveDate]) -> Result<DataFrame> {
        if dates.is_empty() {
            return schema::factors_frame(&[]);
        }

        let sql = format!(
            "SELECT date, mkt, smb, hml, umd FROM daily_factors
             WHERE date IN ({})
             ORDER BY date",
            placeholders(dates.len())
        );

        let args: Vec<String> = dates.iter().map(ToString::to_string).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut observations = Vec::new();
        for row in rows {
            let (date, mkt, smb, hml, umd) = row?;
            observations.push(FactorObservation {
                date: parse_date(&date)?,
                mkt,
                smb,
                hml,
                umd,
            });
        }

        schema::factors_frame(&observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DATE, RET};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .put_returns(&[
                ReturnObservation {
                    security: "AAPL".to_string(),
                    date: date("2020-01-02"),
                    ret: 0.01,
                },
                ReturnObservation {
                    security: "AAPL".to_string(),
                    date: date("2020-01-03"),
                    ret: -0.02,
                },
                ReturnObservation {
                    security: "MSFT".to_string(),
                    date: date("2020-01-02"),
                    ret: 0.03,
                },
            ])
            .unwrap();
        store
            .put_factors(&[FactorObservation {
                date: date("2020-01-02"),
                mkt: 0.005,
                smb: 0.001,
                hml: -0.001,
                umd: 0.002,
            }])
            .unwrap();
        store
    }

    #[test]
    fn test_round_trip_returns() {
        let store = sample_store();
        let frame = store
            .security_returns("AAPL", &[date("2020-01-02"), date("2020-01-03")])
            .unwrap();

        assert_eq!(frame.height(), 2);
        let rets = frame.column(RET).unwrap().f64().unwrap();
        assert_eq!(rets.get(0), Some(0.01));
        assert_eq!(rets.get(1), Some(-0.02));
    }

    #[test]
    fn test_query_filters_by_security() {
        let store = sample_store();
        let frame = store.security_returns("MSFT", &[date("2020-01-02"), date("2020-01-03")]).unwrap();
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn test_missing_dates_absent() {
        let store = sample_store();
        let frame = store.security_returns("AAPL", &[date("2020-01-06")]).unwrap();
        assert_eq!(frame.height(), 0);

        let factors = store.factor_returns(&[date("2020-01-03")]).unwrap();
        assert_eq!(factors.height(), 0);
    }

    #[test]
    fn test_put_replaces_existing_row() {
        let store = sample_store();
        store
            .put_returns(&[ReturnObservation {
                security: "AAPL".to_string(),
                date: date("2020-01-02"),
                ret: 0.05,
            }])
            .unwrap();

        let frame = store.security_returns("AAPL", &[date("2020-01-02")]).unwrap();
        assert_eq!(frame.height(), 1);
        let rets = frame.column(RET).unwrap().f64().unwrap();
        assert_eq!(rets.get(0), Some(0.05));
    }

    #[test]
    fn test_factor_round_trip() {
        let store = sample_store();
        let frame = store.factor_returns(&[date("2020-01-02")]).unwrap();

        assert_eq!(frame.height(), 1);
        let dates = frame.column(DATE).unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("2020-01-02"));
        let mkt = frame.column("mkt").unwrap().f64().unwrap();
        assert_eq!(mkt.get(0), Some(0.005));
    }
}
