//! IC-Sharpe scoring.
//!
//! The score of a prediction table against a true-label table is the mean of
//! the daily rank ICs divided by their sample standard deviation. Every date
//! present in both tables is scored independently; days without enough finite
//! pairs are excluded locally and never reach the aggregate.

use crate::ic::{DailyScore, MIN_DAILY_PAIRS, rank_ic};
use serde::{Deserialize, Serialize};
use solera_traits::stats::{MIN_STD_THRESHOLD, hit_rate, mean, sample_std};
use solera_traits::{DateId, DateTable, Result, SoleraError};
use tracing::debug;

/// Minimum number of daily scores for the aggregate to be defined.
pub const MIN_SCORED_DAYS: usize = 2;

/// Configuration for evaluation reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Number of trading days per year for the annualised IC-Sharpe
    pub trading_days_per_year: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: 252,
        }
    }
}

/// Why a day produced no score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Fewer than [`MIN_DAILY_PAIRS`] finite pairs.
    TooFewPairs,
    /// Truth or prediction is constant over the finite pairs.
    ConstantRanks,
}

/// A date present in both tables that produced no daily score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedDay {
    /// The excluded date.
    pub date_id: DateId,
    /// Finite pairs available on that date.
    pub pairs: usize,
    /// Why the day was skipped.
    pub reason: Exclusion,
}

/// Per-day results of a scoring pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyScores {
    /// Scored days in ascending date order.
    pub scores: Vec<DailyScore>,
    /// Days skipped for insufficient comparable values.
    pub excluded: Vec<ExcludedDay>,
}

impl DailyScores {
    /// The daily IC values in date order.
    pub fn ics(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.ic).collect()
    }

    /// Number of scored days.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether no day was scored.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Mean daily IC over its sample standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcSharpe {
    /// Mean daily IC
    pub mean_ic: f64,
    /// Sample standard deviation of daily IC (N-1)
    pub std_ic: f64,
    /// `mean_ic / std_ic`
    pub sharpe: f64,
    /// Number of daily scores aggregated
    pub days: usize,
}

impl IcSharpe {
    /// Aggregates a daily IC series.
    ///
    /// # Errors
    ///
    /// Returns [`SoleraError::DegenerateAggregation`] for fewer than
    /// [`MIN_SCORED_DAYS`] values, non-finite values, or a standard deviation
    /// at or below [`MIN_STD_THRESHOLD`] (all scores identical).
    ///
    /// # Example
    ///
    /// ```
    /// use solera_eval::IcSharpe;
    ///
    /// let summary = IcSharpe::calculate(&[0.05, 0.03, 0.07]).unwrap();
    /// assert!((summary.sharpe - 2.5).abs() < 1e-9);
    /// assert!(IcSharpe::calculate(&[0.05]).is_err());
    /// ```
    pub fn calculate(ics: &[f64]) -> Result<Self> {
        let days = ics.len();
        let degenerate = |reason: &str| SoleraError::DegenerateAggregation {
            days,
            reason: reason.to_string(),
        };

        if days < MIN_SCORED_DAYS {
            return Err(degenerate("fewer than 2 daily scores"));
        }
        if ics.iter().any(|ic| !ic.is_finite()) {
            return Err(degenerate("non-finite daily score"));
        }

        let (Some(mean_ic), Some(std_ic)) = (mean(ics), sample_std(ics)) else {
            return Err(degenerate("fewer than 2 daily scores"));
        };
        if std_ic <= MIN_STD_THRESHOLD {
            return Err(degenerate("daily scores have zero variance"));
        }

        let sharpe = mean_ic / std_ic;
        if !sharpe.is_finite() {
            return Err(degenerate("non-finite ratio"));
        }

        Ok(Self {
            mean_ic,
            std_ic,
            sharpe,
            days,
        })
    }

    /// IC-Sharpe scaled by the square root of the trading days per year.
    pub fn annualized(&self, trading_days_per_year: usize) -> f64 {
        self.sharpe * (trading_days_per_year as f64).sqrt()
    }
}

/// Scores every date present in both tables.
///
/// # Errors
///
/// Returns [`SoleraError::TableMismatch`] if the tables do not share the exact
/// same target ordering. Days with fewer than three finite pairs (or an
/// all-tied side) are recorded in [`DailyScores::excluded`], not returned as
/// errors.
pub fn daily_scores(truth: &DateTable, pred: &DateTable) -> Result<DailyScores> {
    if !truth.same_targets(pred) {
        return Err(SoleraError::TableMismatch(format!(
            "true table has {} targets, prediction table has {}; orderings differ",
            truth.targets().len(),
            pred.targets().len()
        )));
    }

    let mut result = DailyScores::default();

    for date_id in truth.common_dates(pred) {
        let (Some(t), Some(p)) = (truth.row(date_id), pred.row(date_id)) else {
            continue;
        };

        match rank_ic(date_id, t, p) {
            Ok(score) => result.scores.push(score),
            Err(SoleraError::InsufficientDailyOverlap { date_id, pairs }) => {
                let reason = if pairs < MIN_DAILY_PAIRS {
                    Exclusion::TooFewPairs
                } else {
                    Exclusion::ConstantRanks
                };
                debug!(date_id, pairs, ?reason, "excluding day from IC-Sharpe");
                result.excluded.push(ExcludedDay {
                    date_id,
                    pairs,
                    reason,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(result)
}

/// IC-Sharpe of `pred` against `truth`.
///
/// # Errors
///
/// Propagates [`daily_scores`] errors and
/// [`SoleraError::DegenerateAggregation`] when the aggregate is undefined.
pub fn score(truth: &DateTable, pred: &DateTable) -> Result<f64> {
    let daily = daily_scores(truth, pred)?;
    Ok(IcSharpe::calculate(&daily.ics())?.sharpe)
}

/// IC-Sharpe after restricting both tables to their common targets.
///
/// # Errors
///
/// Returns [`SoleraError::TableMismatch`] when the tables share no target.
pub fn score_aligned(truth: &DateTable, pred: &DateTable) -> Result<f64> {
    let (truth, pred) = align(truth, pred)?;
    score(&truth, &pred)
}

/// Projects both tables onto their common targets, in `truth`'s order.
pub fn align(truth: &DateTable, pred: &DateTable) -> Result<(DateTable, DateTable)> {
    let common = truth.common_targets(pred);
    if common.is_empty() {
        return Err(SoleraError::TableMismatch(
            "tables share no target column".to_string(),
        ));
    }
    Ok((truth.select_targets(&common)?, pred.select_targets(&common)?))
}

/// Full evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Per-day scores and exclusions
    pub daily: DailyScores,
    /// IC-Sharpe summary
    pub summary: IcSharpe,
    /// Annualised IC-Sharpe
    pub annualized_sharpe: f64,
    /// Fraction of scored days with a positive IC
    pub hit_rate: f64,
}

/// Scores `pred` against `truth` and keeps the per-day detail.
pub fn evaluate(truth: &DateTable, pred: &DateTable, config: &MetricsConfig) -> Result<Evaluation> {
    let daily = daily_scores(truth, pred)?;
    let ics = daily.ics();
    let summary = IcSharpe::calculate(&ics)?;

    Ok(Evaluation {
        annualized_sharpe: summary.annualized(config.trading_days_per_year),
        hit_rate: hit_rate(&ics).unwrap_or(f64::NAN),
        summary,
        daily,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TRUTH: [f64; 5] = [0.10, -0.20, 0.50, 0.00, -0.10];
    const PERFECT: [f64; 5] = [2.0, -8.0, 10.0, 0.1, -0.5];
    const SWAPPED: [f64; 5] = [2.0, -8.0, 10.0, -0.5, 0.1];

    fn table(rows: Vec<(DateId, [f64; 5])>) -> DateTable {
        DateTable::new(
            (0..5).collect(),
            rows.into_iter().map(|(d, r)| (d, r.to_vec())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_score_two_days() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH)]);
        let pred = table(vec![(1, PERFECT), (2, SWAPPED)]);

        let sharpe = score(&truth, &pred).unwrap();
        // Daily ICs are 1.0 and 0.9
        assert_relative_eq!(sharpe, 0.95 / 0.005_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_sparse_day_not_in_denominator() {
        let sparse = [0.1, f64::NAN, f64::NAN, 0.3, f64::NAN];
        let truth = table(vec![(1, TRUTH), (2, TRUTH), (3, sparse)]);
        let pred = table(vec![(1, PERFECT), (2, SWAPPED), (3, PERFECT)]);

        let daily = daily_scores(&truth, &pred).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(
            daily.excluded,
            vec![ExcludedDay {
                date_id: 3,
                pairs: 2,
                reason: Exclusion::TooFewPairs
            }]
        );
        assert_relative_eq!(
            score(&truth, &pred).unwrap(),
            0.95 / 0.005_f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_constant_day_excluded() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH), (3, TRUTH)]);
        let flat = [0.5; 5];
        let pred = table(vec![(1, PERFECT), (2, SWAPPED), (3, flat)]);

        let daily = daily_scores(&truth, &pred).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily.excluded[0].reason, Exclusion::ConstantRanks);
        assert_eq!(daily.excluded[0].pairs, 5);
    }

    #[test]
    fn test_only_common_dates_are_scored() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH), (4, TRUTH)]);
        let pred = table(vec![(1, PERFECT), (2, SWAPPED), (3, PERFECT)]);

        let daily = daily_scores(&truth, &pred).unwrap();
        let dates: Vec<DateId> = daily.scores.iter().map(|s| s.date_id).collect();
        assert_eq!(dates, vec![1, 2]);
    }

    #[test]
    fn test_single_day_is_degenerate() {
        let truth = table(vec![(1, TRUTH)]);
        let pred = table(vec![(1, PERFECT)]);
        assert!(matches!(
            score(&truth, &pred),
            Err(SoleraError::DegenerateAggregation { days: 1, .. })
        ));
    }

    #[test]
    fn test_identical_daily_scores_are_degenerate() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH), (3, TRUTH)]);
        let pred = table(vec![(1, PERFECT), (2, PERFECT), (3, PERFECT)]);
        assert!(matches!(
            score(&truth, &pred),
            Err(SoleraError::DegenerateAggregation { days: 3, .. })
        ));
    }

    #[test]
    fn test_no_common_dates_is_degenerate() {
        let truth = table(vec![(1, TRUTH)]);
        let pred = table(vec![(2, PERFECT)]);
        assert!(matches!(
            score(&truth, &pred),
            Err(SoleraError::DegenerateAggregation { days: 0, .. })
        ));
    }

    #[test]
    fn test_ic_sharpe_identical_values() {
        let result = IcSharpe::calculate(&[0.1, 0.1, 0.1]);
        assert!(matches!(
            result,
            Err(SoleraError::DegenerateAggregation { .. })
        ));
    }

    #[test]
    fn test_ic_sharpe_uses_sample_std() {
        let summary = IcSharpe::calculate(&[0.05, 0.03, 0.07]).unwrap();
        assert_relative_eq!(summary.mean_ic, 0.05, epsilon = 1e-12);
        assert_relative_eq!(summary.std_ic, 0.02, epsilon = 1e-12);
        assert_relative_eq!(summary.sharpe, 2.5, epsilon = 1e-9);
        assert_relative_eq!(summary.annualized(252), 2.5 * 252_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_mismatched_targets_rejected() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH)]);
        let pred = DateTable::new(vec![0, 1, 2], vec![(1, vec![1.0, 2.0, 3.0])]).unwrap();
        assert!(matches!(
            score(&truth, &pred),
            Err(SoleraError::TableMismatch(_))
        ));
    }

    #[test]
    fn test_score_aligned_intersects_targets() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH)]);
        // Same predictions with an extra column 9 and reversed column order
        let rev = |r: [f64; 5]| {
            let mut v: Vec<f64> = r.iter().rev().copied().collect();
            v.push(0.0);
            v
        };
        let pred = DateTable::new(
            vec![4, 3, 2, 1, 0, 9],
            vec![(1, rev(PERFECT)), (2, rev(SWAPPED))],
        )
        .unwrap();

        assert_relative_eq!(
            score_aligned(&truth, &pred).unwrap(),
            0.95 / 0.005_f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_align_without_common_targets() {
        let truth = table(vec![(1, TRUTH)]);
        let pred = DateTable::new(vec![7], vec![(1, vec![1.0])]).unwrap();
        assert!(align(&truth, &pred).is_err());
    }

    #[test]
    fn test_evaluate_report() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH), (3, TRUTH)]);
        let reversed = [-2.0, 8.0, -10.0, -0.1, 0.5];
        let pred = table(vec![(1, PERFECT), (2, SWAPPED), (3, reversed)]);

        let report = evaluate(&truth, &pred, &MetricsConfig::default()).unwrap();
        assert_eq!(report.summary.days, 3);
        assert_relative_eq!(report.hit_rate, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(
            report.annualized_sharpe,
            report.summary.sharpe * 252_f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_concurrent_scoring() {
        let truth = table(vec![(1, TRUTH), (2, TRUTH)]);
        let a = table(vec![(1, PERFECT), (2, SWAPPED)]);
        let b = table(vec![(1, SWAPPED), (2, PERFECT)]);

        let (sa, sb) = std::thread::scope(|s| {
            let ha = s.spawn(|| score(&truth, &a));
            let hb = s.spawn(|| score(&truth, &b));
            (ha.join().unwrap(), hb.join().unwrap())
        });
        assert_relative_eq!(sa.unwrap(), sb.unwrap(), epsilon = 1e-12);
    }
}
