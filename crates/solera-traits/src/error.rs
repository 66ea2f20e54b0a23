//! Error types for the solera framework.
//!
//! This module defines the error type shared by the metric engine, the
//! sequential evaluation loop and the data loaders. Run-level failures
//! (shape mismatches, predictor errors) always carry the offending `DateId`.

use crate::types::{DateId, TargetIndex};
use thiserror::Error;

/// The main error type for solera operations.
#[derive(Debug, Error)]
pub enum SoleraError {
    /// The predictor's output key set differs from the targets expected that day.
    #[error(
        "Shape mismatch on date {date_id}: missing targets {missing:?}, unexpected targets {extra:?}"
    )]
    ShapeMismatch {
        /// Served date whose prediction was rejected.
        date_id: DateId,
        /// Expected targets absent from the prediction.
        missing: Vec<TargetIndex>,
        /// Predicted targets that were not expected.
        extra: Vec<TargetIndex>,
    },

    /// The predictor collaborator signalled an error.
    #[error("Predictor failed on date {date_id}: {source}")]
    PredictorFailure {
        /// Served date on which the predictor failed.
        date_id: DateId,
        /// The predictor's own error.
        #[source]
        source: Box<SoleraError>,
    },

    /// A scored day has fewer than three finite pairs, or one side is all tied.
    #[error("Insufficient comparable values on date {date_id} ({pairs} finite pairs)")]
    InsufficientDailyOverlap {
        /// Scored date.
        date_id: DateId,
        /// Number of finite (true, predicted) pairs found.
        pairs: usize,
    },

    /// IC-Sharpe is undefined for the daily score series.
    #[error("Degenerate aggregation over {days} daily scores: {reason}")]
    DegenerateAggregation {
        /// Number of daily scores that were available.
        days: usize,
        /// Why the aggregate is undefined.
        reason: String,
    },

    /// The wall-clock budget ran out before the next step could start.
    #[error("Time budget exhausted before date {date_id} ({completed} steps completed)")]
    BudgetExhausted {
        /// The date that would have been served next.
        date_id: DateId,
        /// Number of steps recorded before stopping.
        completed: usize,
    },

    /// Two tables do not share the same target ordering.
    #[error("Table mismatch: {0}")]
    TableMismatch(String),

    /// A target index is not part of the registry.
    #[error("Unknown target index: {0}")]
    UnknownTarget(TargetIndex),

    /// An operation was attempted in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from the data.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error loading or validating configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl SoleraError {
    /// The served date this error is attached to, if any.
    pub const fn date_id(&self) -> Option<DateId> {
        match self {
            Self::ShapeMismatch { date_id, .. }
            | Self::PredictorFailure { date_id, .. }
            | Self::InsufficientDailyOverlap { date_id, .. }
            | Self::BudgetExhausted { date_id, .. } => Some(*date_id),
            _ => None,
        }
    }
}

impl From<String> for SoleraError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for SoleraError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for solera operations.
pub type Result<T> = std::result::Result<T, SoleraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = SoleraError::ShapeMismatch {
            date_id: 42,
            missing: vec![3],
            extra: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch on date 42: missing targets [3], unexpected targets []"
        );
    }

    #[test]
    fn test_predictor_failure_keeps_source() {
        use std::error::Error;

        let err = SoleraError::PredictorFailure {
            date_id: 7,
            source: Box::new(SoleraError::Other("model diverged".to_string())),
        };
        assert_eq!(err.date_id(), Some(7));
        assert!(err.to_string().contains("model diverged"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_from_string() {
        let err: SoleraError = "bad".into();
        assert!(matches!(err, SoleraError::Other(_)));
        assert_eq!(err.date_id(), None);
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(SoleraError::DegenerateAggregation {
            days: 1,
            reason: "fewer than 2 daily scores".to_string(),
        });
        assert!(err_result.is_err());
    }
}
