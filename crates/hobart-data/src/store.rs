//! Store traits for the two external collaborators of an event study.
//!
//! Both traits are object-safe and read-only; the study core holds them as
//! injected references rather than reaching for process-wide handles, so
//! any backing technology (memory, SQLite, a remote service) can stand in.

use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::DataFrame;

/// Read-only access to daily security returns keyed by `(security, date)`.
pub trait ReturnStore {
    /// Fetch raw-return rows for `security` restricted to the given date
    /// set.
    ///
    /// Returns a frame with columns `security`, `date`, `ret`, sorted
    /// ascending by date. Dates without an observation are simply absent
    /// from the result, never an error.
    fn security_returns(&self, security: &str, dates: &[NaiveDate]) -> Result<DataFrame>;
}

/// Read-only access to the daily factor-return table keyed by date.
pub trait FactorStore {
    /// Fetch daily factor returns for the given date set.
    ///
    /// Returns a frame with columns `date`, `mkt`, `smb`, `hml`, `umd`,
    /// sorted ascending by date. Dates without factor data are absent.
    fn factor_returns(&self, dates: &[NaiveDate]) -> Result<DataFrame>;
}
