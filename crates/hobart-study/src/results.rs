//! Event-study output series and scalars.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-date abnormal return (actual minus model-predicted) for each model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbnormalReturns {
    /// Event-window dates the series are aligned on.
    pub dates: Vec<NaiveDate>,
    /// Abnormal returns under the CAPM (market) model.
    pub capm: Vec<f64>,
    /// Abnormal returns under the Fama-French 3-factor model.
    pub ff3: Vec<f64>,
    /// Abnormal returns under the Carhart 4-factor model.
    pub ff4: Vec<f64>,
}

/// Running compounded return since the event-window start, per column.
///
/// Each series satisfies `cum[t] = (1 + cum[t-1])·(1 + r_t) − 1` with
/// `cum[0] = r_0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeReturns {
    /// Event-window dates the series are aligned on.
    pub dates: Vec<NaiveDate>,
    /// Compounded actual return.
    pub ret: Vec<f64>,
    /// Compounded market factor return.
    pub mkt: Vec<f64>,
    /// Compounded size factor return.
    pub smb: Vec<f64>,
    /// Compounded value factor return.
    pub hml: Vec<f64>,
    /// Compounded momentum factor return.
    pub umd: Vec<f64>,
}

/// Aggregate cumulative abnormal return (additive sum over the event
/// window) per model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativeAbnormal {
    /// CAR under the CAPM model.
    pub capm: f64,
    /// CAR under the 3-factor model.
    pub ff3: f64,
    /// CAR under the 4-factor model.
    pub ff4: f64,
}

impl fmt::Display for CumulativeAbnormal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CAR capm: {:.4}%, ff3: {:.4}%, ff4: {:.4}%",
            self.capm * 100.0,
            self.ff3 * 100.0,
            self.ff4 * 100.0
        )
    }
}

/// Buy-and-hold abnormal returns: compounded actual return minus the
/// compounded benchmark per date.
///
/// The per-model series apply the fitted model to the compounded factor
/// values; the market variant is compounded actual minus compounded
/// market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyHoldAbnormal {
    /// Event-window dates the series are aligned on.
    pub dates: Vec<NaiveDate>,
    /// Market-only BHAR.
    pub mkt: Vec<f64>,
    /// BHAR under the CAPM model.
    pub capm: Vec<f64>,
    /// BHAR under the 3-factor model.
    pub ff3: Vec<f64>,
    /// BHAR under the 4-factor model.
    pub ff4: Vec<f64>,
}

/// Everything a study run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyResults {
    /// Per-date abnormal returns per model.
    pub abnormal: AbnormalReturns,
    /// Cumulative compounded return series.
    pub cumulative: CumulativeReturns,
    /// Aggregate CAR per model.
    pub car: CumulativeAbnormal,
    /// Buy-and-hold abnormal returns.
    pub bhar: BuyHoldAbnormal,
}
