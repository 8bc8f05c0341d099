//! The event-study orchestrator.
//!
//! An [`EventStudy`] owns its windows, loaded frames, fitted models and
//! results. Loading and fitting happen lazily on the first `run_study` and
//! are idempotent; the abnormal-return artifacts are recomputed on every
//! call. `cleanup` discards the heavy per-event frames while keeping the
//! fitted models and the last results.

use crate::error::StudyError;
use crate::regression::{LinearModel, RegressionError};
use crate::results::{
    AbnormalReturns, BuyHoldAbnormal, CumulativeAbnormal, CumulativeReturns, StudyResults,
};
use crate::window::{EventWindows, WindowConfig};
use chrono::NaiveDate;
use hobart_data::schema::{DATE, HML, MKT, RET, SMB, UMD};
use hobart_data::{FactorStore, ReturnStore};
use polars::prelude::*;
use std::fmt;

/// Progress of a study through its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudyState {
    /// Windows derived; nothing loaded yet (also the post-cleanup state).
    Created,
    /// Return and factor frames loaded and joined.
    DataLoaded,
    /// The three factor models are fit.
    ModelsFit,
    /// Results computed by the last `run_study`.
    ResultsReady,
}

/// The three fitted factor models of a study.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModels {
    /// Market-model (CAPM) regression.
    pub capm: LinearModel,
    /// Fama-French 3-factor regression.
    pub ff3: LinearModel,
    /// Carhart 4-factor regression.
    pub ff4: LinearModel,
}

impl FittedModels {
    /// Fit all three models on an estimation-window frame.
    pub fn fit(estimation: &DataFrame) -> Result<Self, RegressionError> {
        let capm = LinearModel::fit(estimation, RET, &[MKT])?;
        let ff3 = LinearModel::fit(estimation, RET, &[MKT, SMB, HML])?;
        let ff4 = LinearModel::fit(estimation, RET, &[MKT, SMB, HML, UMD])?;
        Ok(Self { capm, ff3, ff4 })
    }
}

/// Loaded, factor-joined frames for the two windows.
struct StudyData {
    estimation: DataFrame,
    event: DataFrame,
}

/// An event study for one security around one calendar date.
pub struct EventStudy<'a> {
    security: String,
    event_date: NaiveDate,
    config: WindowConfig,
    windows: EventWindows,
    return_store: &'a dyn ReturnStore,
    factor_store: &'a dyn FactorStore,
    state: StudyState,
    data: Option<StudyData>,
    models: Option<FittedModels>,
    results: Option<StudyResults>,
}

impl fmt::Debug for EventStudy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStudy")
            .field("security", &self.security)
            .field("event_date", &self.event_date)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> EventStudy<'a> {
    /// Create a study for `security` around `event_date`.
    ///
    /// Windows are derived immediately, so invalid window parameters fail
    /// here. The stores are injected read-only collaborators; nothing is
    /// fetched until the first [`run_study`](Self::run_study).
    pub fn new(
        security: impl Into<String>,
        event_date: NaiveDate,
        config: WindowConfig,
        return_store: &'a dyn ReturnStore,
        factor_store: &'a dyn FactorStore,
    ) -> Result<Self, StudyError> {
        let windows = EventWindows::build(event_date, &config)?;
        Ok(Self {
            security: security.into(),
            event_date,
            config,
            windows,
            return_store,
            factor_store,
            state: StudyState::Created,
            data: None,
            models: None,
            results: None,
        })
    }

    /// Run the study: load data and fit models if not already done, then
    /// recompute the abnormal-return artifacts.
    pub fn run_study(&mut self) -> Result<&StudyResults, StudyError> {
        if self.data.is_none() {
            let data = self.fetch_data()?;
            self.data = Some(data);
            self.state = StudyState::DataLoaded;
        }

        if self.models.is_none() {
            let estimation = self
                .data
                .as_ref()
                .map(|d| &d.estimation)
                .ok_or_else(|| StudyError::NotReady("data not loaded".to_string()))?;
            let models = FittedModels::fit(estimation)?;
            self.models = Some(models);
            self.state = StudyState::ModelsFit;
        }

        let data = self
            .data
            .as_ref()
            .ok_or_else(|| StudyError::NotReady("data not loaded".to_string()))?;
        let models = self
            .models
            .as_ref()
            .ok_or_else(|| StudyError::NotReady("models not fit".to_string()))?;
        let results = compute_results(&data.event, models)?;

        self.state = StudyState::ResultsReady;
        Ok(self.results.insert(results))
    }

    /// Drop the loaded frames so the next `run_study` reloads them.
    ///
    /// Fitted models and the last results are kept.
    pub fn cleanup(&mut self) {
        self.data = None;
        self.state = StudyState::Created;
    }

    fn fetch_data(&self) -> Result<StudyData, StudyError> {
        let estimation_returns = self
            .return_store
            .security_returns(&self.security, &self.windows.estimation_window)?;
        if estimation_returns.height() == 0 {
            return Err(StudyError::DataUnavailable {
                security: self.security.clone(),
                window: "estimation".to_string(),
            });
        }

        let event_returns = self
            .return_store
            .security_returns(&self.security, &self.windows.event_window)?;
        if event_returns.height() == 0 {
            return Err(StudyError::DataUnavailable {
                security: self.security.clone(),
                window: "event".to_string(),
            });
        }

        let estimation_factors = self
            .factor_store
            .factor_returns(&self.windows.estimation_window)?;
        let event_factors = self.factor_store.factor_returns(&self.windows.event_window)?;

        Ok(StudyData {
            estimation: join_factors(estimation_returns, estimation_factors)?,
            event: join_factors(event_returns, event_factors)?,
        })
    }

    /// Security identifier.
    pub fn security(&self) -> &str {
        &self.security
    }

    /// Event date the windows are anchored on.
    pub const fn event_date(&self) -> NaiveDate {
        self.event_date
    }

    /// Window parameters.
    pub const fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Derived event and estimation windows.
    pub const fn windows(&self) -> &EventWindows {
        &self.windows
    }

    /// Current pipeline state.
    pub const fn state(&self) -> StudyState {
        self.state
    }

    /// Results of the last `run_study`, if any.
    pub const fn results(&self) -> Option<&StudyResults> {
        self.results.as_ref()
    }

    /// The fitted models, if fitting has happened.
    pub const fn models(&self) -> Option<&FittedModels> {
        self.models.as_ref()
    }

    /// The loaded, factor-joined estimation frame.
    pub fn estimation_data(&self) -> Option<&DataFrame> {
        self.data.as_ref().map(|d| &d.estimation)
    }

    /// The loaded, factor-joined event frame.
    pub fn event_data(&self) -> Option<&DataFrame> {
        self.data.as_ref().map(|d| &d.event)
    }
}

impl fmt::Display for EventStudy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = &self.windows.event_window;
        let estimation = &self.windows.estimation_window;
        write!(
            f,
            "Security: {}\nEvent date: {}\nEvent window: {} to {} ({} business days)\nEstimation window: {} to {} ({} business days)",
            self.security,
            self.event_date,
            event[0],
            event[event.len() - 1],
            event.len(),
            estimation[0],
            estimation[estimation.len() - 1],
            estimation.len(),
        )
    }
}

/// Left-join the factor frame onto the return frame on date.
fn join_factors(returns: DataFrame, factors: DataFrame) -> Result<DataFrame, StudyError> {
    let joined = returns
        .lazy()
        .join(
            factors.lazy(),
            [col(DATE)],
            [col(DATE)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([DATE], Default::default())
        .collect()?;
    Ok(joined)
}

/// Compute abnormal, cumulative, CAR and BHAR artifacts from the joined
/// event-window frame. Pure with respect to its inputs.
fn compute_results(event: &DataFrame, models: &FittedModels) -> Result<StudyResults, StudyError> {
    let dates = date_values(event)?;
    let actual = f64_values(event, RET)?;

    let capm = abnormal(&actual, &models.capm.predict(event)?);
    let ff3 = abnormal(&actual, &models.ff3.predict(event)?);
    let ff4 = abnormal(&actual, &models.ff4.predict(event)?);

    let car = CumulativeAbnormal {
        capm: capm.iter().sum(),
        ff3: ff3.iter().sum(),
        ff4: ff4.iter().sum(),
    };

    let cum_ret = compound(&actual);
    let cum_mkt = compound(&f64_values(event, MKT)?);
    let cum_smb = compound(&f64_values(event, SMB)?);
    let cum_hml = compound(&f64_values(event, HML)?);
    let cum_umd = compound(&f64_values(event, UMD)?);

    // BHAR applies each model to the compounded factor values, mirroring
    // the additive-period regression onto buy-and-hold space.
    let cumulative_frame = DataFrame::new(vec![
        Series::new(RET.into(), cum_ret.clone()).into(),
        Series::new(MKT.into(), cum_mkt.clone()).into(),
        Series::new(SMB.into(), cum_smb.clone()).into(),
        Series::new(HML.into(), cum_hml.clone()).into(),
        Series::new(UMD.into(), cum_umd.clone()).into(),
    ])?;

    let bhar_mkt = abnormal(&cum_ret, &cum_mkt);
    let bhar_capm = abnormal(&cum_ret, &models.capm.predict(&cumulative_frame)?);
    let bhar_ff3 = abnormal(&cum_ret, &models.ff3.predict(&cumulative_frame)?);
    let bhar_ff4 = abnormal(&cum_ret, &models.ff4.predict(&cumulative_frame)?);

    Ok(StudyResults {
        abnormal: AbnormalReturns {
            dates: dates.clone(),
            capm,
            ff3,
            ff4,
        },
        cumulative: CumulativeReturns {
            dates: dates.clone(),
            ret: cum_ret,
            mkt: cum_mkt,
            smb: cum_smb,
            hml: cum_hml,
            umd: cum_umd,
        },
        car,
        bhar: BuyHoldAbnormal {
            dates,
            mkt: bhar_mkt,
            capm: bhar_capm,
            ff3: bhar_ff3,
            ff4: bhar_ff4,
        },
    })
}

/// Elementwise actual minus benchmark.
fn abnormal(actual: &[f64], benchmark: &[f64]) -> Vec<f64> {
    actual
        .iter()
        .zip(benchmark)
        .map(|(a, b)| a - b)
        .collect()
}

/// Running compounded return: `(Π (1 + r_t)) − 1` per date.
fn compound(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

/// Extract the date column as `NaiveDate`s.
fn date_values(frame: &DataFrame) -> Result<Vec<NaiveDate>, StudyError> {
    let column = frame.column(DATE)?.str()?;
    column
        .into_no_null_iter()
        .map(|text| {
            text.parse()
                .map_err(|_| StudyError::InvalidDate(text.to_string()))
        })
        .collect()
}

/// Extract a null-free f64 column.
fn f64_values(frame: &DataFrame, name: &str) -> Result<Vec<f64>, StudyError> {
    let values = frame.column(name)?.f64()?;
    if values.null_count() > 0 {
        return Err(StudyError::MissingValues {
            column: name.to_string(),
        });
    }
    Ok(values.into_no_null_iter().collect())
}

/// A batch of independent event studies for one security.
///
/// Each event owns its own frames and models, so studies can be run in any
/// order (or in parallel by callers splitting the slice).
#[derive(Debug)]
pub struct MultipleEvents<'a> {
    events: Vec<EventStudy<'a>>,
}

impl<'a> MultipleEvents<'a> {
    /// Create one study per event date, sharing window parameters and
    /// stores.
    pub fn new(
        security: impl Into<String>,
        event_dates: &[NaiveDate],
        config: WindowConfig,
        return_store: &'a dyn ReturnStore,
        factor_store: &'a dyn FactorStore,
    ) -> Result<Self, StudyError> {
        let security = security.into();
        let mut events = Vec::with_capacity(event_dates.len());
        for &event_date in event_dates {
            events.push(EventStudy::new(
                security.clone(),
                event_date,
                config.clone(),
                return_store,
                factor_store,
            )?);
        }
        Ok(Self { events })
    }

    /// Run every study, stopping at the first failure.
    pub fn run_all(&mut self) -> Result<(), StudyError> {
        for event in &mut self.events {
            event.run_study()?;
        }
        Ok(())
    }

    /// The studies, in event-date order of construction.
    pub fn events(&self) -> &[EventStudy<'a>] {
        &self.events
    }

    /// Mutable access for callers driving studies individually.
    pub fn events_mut(&mut self) -> &mut [EventStudy<'a>] {
        &mut self.events
    }

    /// Number of studies in the batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compound_recursion() {
        let cum = compound(&[0.1, -0.05, 0.02]);
        assert_relative_eq!(cum[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(cum[1], (1.0 + cum[0]) * (1.0 - 0.05) - 1.0, epsilon = 1e-12);
        assert_relative_eq!(cum[2], (1.0 + cum[1]) * (1.0 + 0.02) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compound_empty() {
        assert!(compound(&[]).is_empty());
    }

    #[test]
    fn test_abnormal_elementwise() {
        let diff = abnormal(&[0.02, 0.01], &[0.015, 0.02]);
        assert_relative_eq!(diff[0], 0.005, epsilon = 1e-12);
        assert_relative_eq!(diff[1], -0.01, epsilon = 1e-12);
    }
}
