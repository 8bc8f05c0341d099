//! Error type for event-study runs.

use crate::regression::RegressionError;
use crate::window::WindowError;
use hobart_data::DataError;
use thiserror::Error;

/// Errors that can surface from constructing or running an event study.
#[derive(Debug, Error)]
pub enum StudyError {
    /// Window construction error
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Store error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Regression error
    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// The store returned no rows for a required window
    #[error("No data for {security} in the {window} window")]
    DataUnavailable {
        /// Security that was queried
        security: String,
        /// Window label ("estimation" or "event")
        window: String,
    },

    /// A date column held a value that is not an ISO-8601 date
    #[error("Invalid date in frame: {0}")]
    InvalidDate(String),

    /// A frame column required for the computation held nulls
    #[error("Missing values in column '{column}'")]
    MissingValues {
        /// Offending column name
        column: String,
    },

    /// An artifact was requested before the pipeline built it
    #[error("Study not ready: {0}")]
    NotReady(String),
}
