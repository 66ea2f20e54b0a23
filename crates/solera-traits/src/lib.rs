#![doc(issue_tracker_base_url = "https://github.com/factordynamics/solera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and trait definitions for the solera evaluation harness.
//!
//! This crate provides the shared vocabulary of the workspace: served dates
//! and targets, per-date value vectors, date-indexed tables, the predictor
//! collaborator contract and the data capabilities the sequential loop reads
//! from.

/// The version of the solera-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod predictor;
pub mod registry;
pub mod source;
pub mod stats;
pub mod table;
pub mod types;

// Re-exports
pub use error::{Result, SoleraError};
pub use predictor::{BudgetStatus, LabelHistory, PredictionContext, Predictor, RecordedPrediction};
pub use registry::{Instruments, Target, TargetRegistry};
pub use source::{FeatureSource, LaggedLabelRow, LaggedLabelSource, LaggedLabelStore, NoFeatures};
pub use table::DateTable;
pub use types::{
    DateId, FeatureBatch, LabelVector, PredictionVector, TargetIndex, TargetValues,
};
