//! In-memory return and factor store.
//!
//! The reference store for tests and small studies. Observations live in
//! BTreeMaps so queries come back in date order without extra sorting.

use crate::error::Result;
use crate::schema::{self, FactorObservation, ReturnObservation};
use crate::store::{FactorStore, ReturnStore};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;

/// BTreeMap-backed store implementing both store traits.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    returns: BTreeMap<(String, NaiveDate), f64>,
    factors: BTreeMap<NaiveDate, FactorObservation>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single return observation, replacing any existing one for
    /// the same `(security, date)`.
    pub fn add_return(&mut self, observation: ReturnObservation) {
        self.returns
            .insert((observation.security, observation.date), observation.ret);
    }

    /// Insert a single factor observation, replacing any existing one for
    /// the same date.
    pub fn add_factors(&mut self, observation: FactorObservation) {
        self.factors.insert(observation.date, observation);
    }

    /// Bulk-insert return observations.
    pub fn extend_returns(&mut self, observations: impl IntoIterator<Item = ReturnObservation>) {
        for observation in observations {
            self.add_return(observation);
        }
    }

    /// Bulk-insert factor observations.
    pub fn extend_factors(&mut self, observations: impl IntoIterator<Item = FactorObservation>) {
        for observation in observations {
            self.add_factors(observation);
        }
    }

    /// Number of return observations held.
    pub fn return_count(&self) -> usize {
        self.returns.len()
    }

    /// Number of factor dates held.
    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }
}

impl ReturnStore for MemoryStore {
    fn security_returns(&self, security: &str, dates: &[NaiveDate]) -> Result<DataFrame> {
        let observations: Vec<ReturnObservation> = dates
            .iter()
            .filter_map(|date| {
                self.returns
                    .get(&(security.to_string(), *date))
                    .map(|&ret| ReturnObservation {
                        security: security.to_string(),
                        date: *date,
                        ret,
                    })
            })
            .collect();

        schema::returns_frame(&observations)
    }
}

impl FactorStore for MemoryStore {
    fn factor_returns(&self, dates: &[NaiveDate]) -> Result<DataFrame> {
        let observations: Vec<FactorObservation> = dates
            .iter()
            .filter_map(|date| self.factors.get(date).copied())
            .collect();

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

    fn sample_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        for (d, ret) in [("2020-01-02", 0.01), ("2020-01-03", -0.02), ("2020-01-06", 0.005)] {
            store.add_return(ReturnObservation {
                security: "AAPL".to_string(),
                date: date(d),
                ret,
            });
            store.add_factors(FactorObservation {
                date: date(d),
                mkt: ret / 2.0,
                smb: 0.001,
                hml: -0.001,
                umd: 0.002,
            });
        }
        store
    }

    #[test]
    fn test_query_restricted_to_date_set() {
        let store = sample_store();
        let frame = store
            .security_returns("AAPL", &[date("2020-01-02"), date("2020-01-06")])
            .unwrap();

        assert_eq!(frame.height(), 2);
        let rets = frame.column(RET).unwrap().f64().unwrap();
        assert_eq!(rets.get(0), Some(0.01));
        assert_eq!(rets.get(1), Some(0.005));
    }

    #[test]
    fn test_missing_dates_absent_not_error() {
        let store = sample_store();
        let frame = store
            .security_returns("AAPL", &[date("2020-01-04"), date("2020-01-05")])
            .unwrap();
        assert_eq!(frame.height(), 0);
    }

    #[test]
    fn test_unknown_security_yields_empty_frame() {
        let store = sample_store();
        let frame = store.security_returns("MSFT", &[date("2020-01-02")]).unwrap();
        assert_eq!(frame.height(), 0);
    }

    #[test]
    fn test_factor_query_sorted() {
        let store = sample_store();
        let frame = store
            .factor_returns(&[date("2020-01-06"), date("2020-01-02")])
            .unwrap();

        let dates = frame.column(DATE).unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("2020-01-02"));
        assert_eq!(dates.get(1), Some("2020-01-06"));
    }
}
