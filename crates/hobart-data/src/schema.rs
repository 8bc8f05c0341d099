//! Frame schema shared by the stores and the study core.
//!
//! Dates travel through frames as ISO-8601 strings so that joins align on
//! date exactly regardless of the backing store, and so that lexicographic
//! order is chronological order.

use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Security identifier column.
pub const SECURITY: &str = "security";

/// Date column (ISO-8601 string).
pub const DATE: &str = "date";

/// Raw period return column.
pub const RET: &str = "ret";

/// Market factor return column.
pub const MKT: &str = "mkt";

/// Size factor return column (small minus big).
pub const SMB: &str = "smb";

/// Value factor return column (high minus low).
pub const HML: &str = "hml";

/// Momentum factor return column (up minus down).
pub const UMD: &str = "umd";

/// Factor columns in canonical order.
pub const FACTOR_COLUMNS: &[&str] = &[MKT, SMB, HML, UMD];

/// A single daily return observation for one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnObservation {
    /// Security identifier.
    pub security: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Raw period return.
    pub ret: f64,
}

/// Daily factor returns for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Observation date.
    pub date: NaiveDate,
    /// Market factor return.
    pub mkt: f64,
    /// Size factor return.
    pub smb: f64,
    /// Value factor return.
    pub hml: f64,
    /// Momentum factor return.
    pub umd: f64,
}

/// Build a date-sorted return frame (`security`, `date`, `ret`) from
/// observations.
pub fn returns_frame(observations: &[ReturnObservation]) -> Result<DataFrame> {
    let mut observations: Vec<&ReturnObservation> = observations.iter().collect();
    observations.sort_by_key(|o| o.date);

    let securities: Vec<&str> = observations.iter().map(|o| o.security.as_str()).collect();
    let dates: Vec<String> = observations.iter().map(|o| o.date.to_string()).collect();
    let rets: Vec<f64> = observations.iter().map(|o| o.ret).collect();

    let df = DataFrame::new(vec![
        Series::new(SECURITY.into(), securities).into(),
        Series::new(DATE.into(), dates).into(),
        Series::new(RET.into(), rets).into(),
    ])?;

    Ok(df)
}

/// Build a date-sorted factor frame (`date`, `mkt`, `smb`, `hml`, `umd`)
/// from observations.
pub fn factors_frame(observations: &[FactorObservation]) -> Result<DataFrame> {
    let mut observations: Vec<&FactorObservation> = observations.iter().collect();
    observations.sort_by_key(|o| o.date);

    let dates: Vec<String> = observations.iter().map(|o| o.date.to_string()).collect();
    let mkt: Vec<f64> = observations.iter().map(|o| o.mkt).collect();
    let smb: Vec<f64> = observations.iter().map(|o| o.smb).collect();
    let hml: Vec<f64> = observations.iter().map(|o| o.hml).collect();
    let umd: Vec<f64> = observations.iter().map(|o| o.umd).collect();

    let df = DataFrame::new(vec![
        Series::new(DATE.into(), dates).into(),
        Series::new(MKT.into(), mkt).into(),
        Series::new(SMB.into(), smb).into(),
        Series::new(HML.into(), hml).into(),
        Series::new(UMD.into(), umd).into(),
    ])?;

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(date: &str, ret: f64) -> ReturnObservation {
        ReturnObservation {
            security: "AAPL".to_string(),
            date: date.parse().unwrap(),
            ret,
        }
    }

    #[test]
    fn test_returns_frame_sorted_by_date() {
        let frame = returns_frame(&[obs("2020-01-03", 0.02), obs("2020-01-02", 0.01)]).unwrap();

        assert_eq!(frame.height(), 2);
        let dates = frame.column(DATE).unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("2020-01-02"));
        assert_eq!(dates.get(1), Some("2020-01-03"));
    }

    #[test]
    fn test_empty_returns_frame() {
        let frame = returns_frame(&[]).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 3);
    }

    #[test]
    fn test_factors_frame_columns() {
        let frame = factors_frame(&[FactorObservation {
            date: "2020-01-02".parse().unwrap(),
            mkt: 0.01,
            smb: 0.002,
            hml: -0.001,
            umd: 0.003,
        }])
        .unwrap();

        assert_eq!(frame.height(), 1);
        for column in FACTOR_COLUMNS {
            assert!(frame.column(column).is_ok());
        }
    }
}
