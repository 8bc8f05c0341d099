//! CSV ingestion for return and factor observations.
//!
//! Files deserialize straight into the schema record types. Expected
//! headers: `security,date,ret` for returns and `date,mkt,smb,hml,umd`
//! for factors, with ISO-8601 dates.

use crate::error::Result;
use crate::schema::{FactorObservation, ReturnObservation};
use serde::de::DeserializeOwned;
use std::path::Path;

fn read_observations<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut observations = Vec::new();
    for record in reader.deserialize() {
        observations.push(record?);
    }
    Ok(observations)
}

/// Read security return observations from a CSV file.
pub fn read_return_observations<P: AsRef<Path>>(path: P) -> Result<Vec<ReturnObservation>> {
    read_observations(path)
}

/// Read daily factor observations from a CSV file.
pub fn read_factor_observations<P: AsRef<Path>>(path: P) -> Result<Vec<FactorObservation>> {
    read_observations(path)
}
