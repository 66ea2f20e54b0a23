#![doc(issue_tracker_base_url = "https://github.com/factordynamics/solera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Leakage-safe sequential evaluation for solera.
//!
//! The [`SequentialEvaluationLoop`] serves a calendar of dates one step at a
//! time. On each step it:
//! - cuts the feature rows at the served date
//! - releases only lagged labels describing strictly earlier dates
//! - asks the predictor for one value per expected target
//! - rejects predictions that miss or add targets
//!
//! The resulting [`OutputTable`] is written out as a submission, or scored
//! against realised labels with [`SequentialEvaluationLoop::run_offline`].
//!
//! # Example
//!
//! ```rust,ignore
//! use solera_sim::{SequentialEvaluationLoop, SimulationConfig};
//! use solera_traits::NoFeatures;
//!
//! let mut sim = SequentialEvaluationLoop::new(
//!     dates,
//!     registry,
//!     lagged_labels,
//!     NoFeatures,
//!     predictor,
//!     SimulationConfig::default(),
//! )?;
//! let report = sim.run_offline(&truth)?;
//! println!("IC-Sharpe: {:.4}", report.evaluation.summary.sharpe);
//! ```

pub mod budget;
pub mod config;
pub mod context;
pub mod output;
pub mod sequential;
pub mod validate;

pub use budget::TimeBudget;
pub use config::{DEFAULT_LAGS, SchemaPolicy, SimulationConfig};
pub use context::{ReleasedLabels, expected_targets, released_labels, visible_features};
pub use output::OutputTable;
pub use sequential::{LoopState, OfflineReport, SequentialEvaluationLoop};
pub use validate::{QualityWarning, quality_warning, validate_shape};
