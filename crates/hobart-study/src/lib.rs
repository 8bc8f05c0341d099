#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod regression;
pub mod results;
pub mod window;

pub use error::StudyError;
pub use event::{EventStudy, FittedModels, MultipleEvents, StudyState};
pub use regression::{LinearModel, RegressionError};
pub use results::{
    AbnormalReturns, BuyHoldAbnormal, CumulativeAbnormal, CumulativeReturns, StudyResults,
};
pub use window::{EventWindows, WindowConfig, WindowError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
