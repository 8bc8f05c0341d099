//! Ordinary least squares on frame columns.
//!
//! Fits `response = intercept + Σ coef·feature` by solving the normal
//! equations `(XᵀX)β = Xᵀy` with Gaussian elimination. Degenerate input
//! (collinear features, too few rows, nulls in a regression column) is an
//! explicit error, never a silent NaN.

use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pivot magnitude below which the normal equations are treated as singular.
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Errors from fitting or applying a linear model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegressionError {
    /// A regression column is absent from the frame
    #[error("Column '{0}' missing from frame")]
    MissingColumn(String),

    /// A regression column is not a float column
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    /// A regression column holds nulls
    #[error("Column '{column}' holds {nulls} null value(s)")]
    MissingValues {
        /// Offending column name
        column: String,
        /// Number of nulls found
        nulls: usize,
    },

    /// Not enough rows to determine the coefficients
    #[error("Insufficient observations: {observations} rows for {required} required")]
    InsufficientObservations {
        /// Rows available
        observations: usize,
        /// Minimum rows required (coefficients + 1)
        required: usize,
    },

    /// The design matrix is singular (collinear features)
    #[error("Singular design matrix: features are collinear")]
    SingularMatrix,
}

/// A fitted linear model over named frame columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    response: String,
    features: Vec<String>,
    intercept: f64,
    coefficients: Vec<f64>,
    residuals: Vec<f64>,
    r_squared: f64,
    n_observations: usize,
}

impl LinearModel {
    /// Fit the model on `frame`, regressing `response` on `features` with
    /// an intercept.
    ///
    /// Requires strictly more rows than coefficients (features + 1) so the
    /// fit is overdetermined.
    pub fn fit(
        frame: &DataFrame,
        response: &str,
        features: &[&str],
    ) -> Result<Self, RegressionError> {
        let y_values = column_values(frame, response)?;
        let n = y_values.len();
        let k = features.len() + 1;
        if n < k + 1 {
            return Err(RegressionError::InsufficientObservations {
                observations: n,
                required: k + 1,
            });
        }

        let mut design = Array2::<f64>::ones((n, k));
        for (j, feature) in features.iter().enumerate() {
            let values = column_values(frame, feature)?;
            for (i, value) in values.into_iter().enumerate() {
                design[[i, j + 1]] = value;
            }
        }

        let y = Array1::from(y_values);
        let xtx = design.t().dot(&design);
        let xty = design.t().dot(&y);
        let beta = solve(xtx, xty)?;

        let predicted = design.dot(&beta);
        let residuals: Vec<f64> = y
            .iter()
            .zip(predicted.iter())
            .map(|(actual, fitted)| actual - fitted)
            .collect();
        let mean_y = y.mean().unwrap_or(0.0);
        let ss_tot: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
        let ss_res: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let r_squared = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        Ok(Self {
            response: response.to_string(),
            features: features.iter().map(ToString::to_string).collect(),
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
            residuals,
            r_squared,
            n_observations: n,
        })
    }

    /// Predict the response for every row of a frame carrying the model's
    /// feature columns.
    pub fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>, RegressionError> {
        let mut predictions = vec![self.intercept; frame.height()];
        for (coefficient, feature) in self.coefficients.iter().zip(&self.features) {
            let values = column_values(frame, feature)?;
            for (prediction, value) in predictions.iter_mut().zip(values) {
                *prediction += coefficient * value;
            }
        }
        Ok(predictions)
    }

    /// Name of the response column the model was fit on.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Names of the feature columns, in coefficient order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Fitted intercept.
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Fitted coefficients, ordered as `features()`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// In-sample residuals, one per estimation row.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// In-sample coefficient of determination.
    pub const fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Number of rows the model was fit on.
    pub const fn n_observations(&self) -> usize {
        self.n_observations
    }
}

/// Extract a null-free f64 column.
fn column_values(frame: &DataFrame, name: &str) -> Result<Vec<f64>, RegressionError> {
    let column = frame
        .column(name)
        .map_err(|_| RegressionError::MissingColumn(name.to_string()))?;
    let values = column
        .f64()
        .map_err(|_| RegressionError::NotNumeric(name.to_string()))?;
    if values.null_count() > 0 {
        return Err(RegressionError::MissingValues {
            column: name.to_string(),
            nulls: values.null_count(),
        });
    }
    Ok(values.into_no_null_iter().collect())
}

/// Solve `a·x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, RegressionError> {
    let k = a.nrows();

    for pivot_col in 0..k {
        // Partial pivoting: bring the largest remaining entry up
        let mut pivot_row = pivot_col;
        let mut pivot_value = a[[pivot_col, pivot_col]].abs();
        for row in (pivot_col + 1)..k {
            let candidate = a[[row, pivot_col]].abs();
            if candidate > pivot_value {
                pivot_row = row;
                pivot_value = candidate;
            }
        }
        if pivot_value < SINGULARITY_TOLERANCE {
            return Err(RegressionError::SingularMatrix);
        }
        if pivot_row != pivot_col {
            for col in 0..k {
                let tmp = a[[pivot_col, col]];
                a[[pivot_col, col]] = a[[pivot_row, col]];
                a[[pivot_row, col]] = tmp;
            }
            b.swap(pivot_col, pivot_row);
        }

        for row in (pivot_col + 1)..k {
            let factor = a[[row, pivot_col]] / a[[pivot_col, pivot_col]];
            for col in pivot_col..k {
                a[[row, col]] -= factor * a[[pivot_col, col]];
            }
            b[row] -= factor * b[pivot_col];
        }
    }

    // Back substitution
    let mut x = Array1::<f64>::zeros(k);
    for row in (0..k).rev() {
        let mut sum = b[row];
        for col in (row + 1)..k {
            sum -= a[[row, col]] * x[col];
        }
        x[row] = sum / a[[row, row]];
    }

    Ok(x)
}
