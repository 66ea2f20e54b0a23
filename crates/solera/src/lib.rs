#![doc(issue_tracker_base_url = "https://github.com/factordynamics/solera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # solera
//!
//! IC-Sharpe scoring and leakage-safe sequential evaluation for daily
//! cross-sectional return prediction.
//!
//! solera is an umbrella crate that re-exports all solera sub-crates for
//! convenience.
//!
//! ## Quick Start
//!
//! ```ignore
//! use solera::data::{LabelReplay, load_label_table, load_registry};
//! use solera::sim::{SequentialEvaluationLoop, SimulationConfig};
//! use solera::{NoFeatures, Result};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let registry = Arc::new(load_registry("data/target_pairs.csv")?);
//! let truth = load_label_table("data/train_labels.csv", Some(&registry))?;
//! let replay = LabelReplay::new(truth.clone(), &registry)?;
//!
//! let mut sim = SequentialEvaluationLoop::new(
//!     truth.dates().to_vec(),
//!     registry,
//!     replay,
//!     NoFeatures,
//!     my_predictor,
//!     SimulationConfig::default(),
//! )?;
//! let report = sim.run_offline(&truth)?;
//! println!("IC-Sharpe: {:.4}", report.evaluation.summary.sharpe);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types and the [`Predictor`] contract
//! - [`eval`] - Daily rank IC and IC-Sharpe
//! - [`sim`] - The sequential evaluation loop
//! - [`data`] - File loaders, label replay and the submission writer

/// The version of the solera crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Traits and Types
// ============================================================================

/// Core types and trait definitions.
///
/// - [`Predictor`] - The collaborator that produces one prediction per date
/// - [`LaggedLabelSource`] - Labels released on a served date
/// - [`FeatureSource`] - Feature rows served with a date
pub mod traits {
    pub use solera_traits::*;
}

pub use solera_traits::{FeatureSource, LaggedLabelSource, NoFeatures, Predictor};

// Re-export error types
pub use solera_traits::{Result, SoleraError};

// Re-export common types
pub use solera_traits::{
    DateId, DateTable, PredictionContext, PredictionVector, TargetIndex, TargetRegistry,
};

// ============================================================================
// Scoring
// ============================================================================

/// Daily rank IC and IC-Sharpe.
///
/// ```text
/// IC_t      = spearman(truth_t, prediction_t)   over finite pairs, >= 3
/// IC-Sharpe = mean(IC) / std(IC)                sample std, >= 2 days
/// ```
///
/// Days without three finite pairs are excluded, not scored as zero.
pub mod eval {
    pub use solera_eval::*;
}

// ============================================================================
// Sequential Evaluation
// ============================================================================

/// The leakage-safe sequential evaluation loop.
pub mod sim {
    pub use solera_sim::*;
}

// ============================================================================
// Data
// ============================================================================

/// File-backed collaborators.
pub mod data {
    pub use solera_data::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use solera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::eval::{IcSharpe, score};
    pub use crate::sim::{OutputTable, SequentialEvaluationLoop, SimulationConfig};
    pub use crate::traits::*;
}
