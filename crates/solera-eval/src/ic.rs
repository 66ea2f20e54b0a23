//! Daily rank Information Coefficient.
//!
//! The daily IC is the Spearman rank correlation between the true labels and
//! the predictions of one date, computed over the targets where both values
//! are finite. Exact ties share the average of the positions they occupy.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use solera_traits::{DateId, Result, SoleraError};

/// Minimum number of finite (true, predicted) pairs for a day to be scored.
pub const MIN_DAILY_PAIRS: usize = 3;

/// Rank IC of one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyScore {
    /// Scored date.
    pub date_id: DateId,
    /// Spearman rank correlation, in [-1, 1].
    pub ic: f64,
    /// Number of finite pairs the correlation was computed on.
    pub pairs: usize,
}

/// Computes the rank IC of one date.
///
/// # Errors
///
/// Returns [`SoleraError::InsufficientDailyOverlap`] when fewer than
/// [`MIN_DAILY_PAIRS`] finite pairs exist, or when either side is constant
/// over them so the correlation is undefined. Callers aggregating many days
/// skip such days. Returns [`SoleraError::TableMismatch`] when the vectors
/// differ in length.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use solera_eval::rank_ic;
///
/// let truth = array![0.10, -0.20, 0.50, 0.00, -0.10];
/// let pred = array![2.0, -8.0, 10.0, 0.1, -0.5];
/// let score = rank_ic(1, truth.view(), pred.view()).unwrap();
/// assert!((score.ic - 1.0).abs() < 1e-12);
/// ```
pub fn rank_ic(
    date_id: DateId,
    truth: ArrayView1<'_, f64>,
    pred: ArrayView1<'_, f64>,
) -> Result<DailyScore> {
    if truth.len() != pred.len() {
        return Err(SoleraError::TableMismatch(format!(
            "date {date_id}: {} true values vs {} predictions",
            truth.len(),
            pred.len()
        )));
    }

    // Keep only finite pairs
    let (t, p): (Vec<f64>, Vec<f64>) = truth
        .iter()
        .zip(pred.iter())
        .filter(|(t, p)| t.is_finite() && p.is_finite())
        .map(|(&t, &p)| (t, p))
        .unzip();

    let pairs = t.len();
    if pairs < MIN_DAILY_PAIRS {
        return Err(SoleraError::InsufficientDailyOverlap { date_id, pairs });
    }

    match spearman(&t, &p) {
        Some(ic) => Ok(DailyScore { date_id, ic, pairs }),
        None => Err(SoleraError::InsufficientDailyOverlap { date_id, pairs }),
    }
}

/// Spearman rank correlation of two equally long slices of finite values.
///
/// Returns `None` for fewer than two values or when either side is constant.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Compute ranks of values (exact ties get the average rank).
///
/// Ranks are zero-based; the offset is irrelevant for correlation.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();

    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;

    while i < n {
        let mut j = i;
        // Find ties
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        // Average rank for ties
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for &(original, _) in &indexed[i..j] {
            ranks[original] = avg_rank;
        }

        i = j;
    }

    ranks
}

/// Pearson correlation coefficient.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    // Rounding can push the ratio just outside [-1, 1]
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
