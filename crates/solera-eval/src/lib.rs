//! Scoring for solera.
//!
//! This crate computes the IC-Sharpe of a prediction table against a table of
//! realised labels:
//! - Daily rank IC (Spearman correlation over the finite targets of a date)
//! - IC-Sharpe: mean daily IC over its sample standard deviation
//! - Per-day detail with the days excluded for insufficient overlap
//!
//! Scoring is a pure function of its two inputs and may run concurrently on
//! independent tables.
//!
//! # Example
//!
//! ```rust,ignore
//! use solera_eval::{MetricsConfig, evaluate, score};
//!
//! let sharpe = score(&truth, &predictions)?;
//!
//! let report = evaluate(&truth, &predictions, &MetricsConfig::default())?;
//! println!("{} days, mean IC {:.4}", report.summary.days, report.summary.mean_ic);
//! ```

pub mod ic;
pub mod metric;

// Re-export main types
pub use ic::{DailyScore, MIN_DAILY_PAIRS, rank_ic, spearman};
pub use metric::{
    DailyScores, Evaluation, ExcludedDay, Exclusion, IcSharpe, MIN_SCORED_DAYS, MetricsConfig, align,
    daily_scores, evaluate, score, score_aligned,
};
