//! Prediction validation.

use serde::{Deserialize, Serialize};
use solera_traits::{DateId, PredictionVector, Result, SoleraError, TargetIndex};
use std::collections::BTreeSet;

/// A correctly shaped prediction that contains non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityWarning {
    /// Served date.
    pub date_id: DateId,
    /// Number of NaN or infinite entries.
    pub non_finite: usize,
}

/// Checks that `prediction` covers exactly the `expected` targets.
///
/// Nothing is repaired: a missing target is not filled and an extra one is
/// not dropped.
pub fn validate_shape(
    date_id: DateId,
    expected: &BTreeSet<TargetIndex>,
    prediction: &PredictionVector,
) -> Result<()> {
    let got = prediction.target_set();
    if &got == expected {
        return Ok(());
    }
    Err(SoleraError::ShapeMismatch {
        date_id,
        missing: expected.difference(&got).copied().collect(),
        extra: got.difference(expected).copied().collect(),
    })
}

/// Flags non-finite values in an otherwise valid prediction.
pub fn quality_warning(date_id: DateId, prediction: &PredictionVector) -> Option<QualityWarning> {
    match prediction.non_finite_count() {
        0 => None,
        non_finite => Some(QualityWarning {
            date_id,
            non_finite,
        }),
    }
}
