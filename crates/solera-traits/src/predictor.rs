//! Predictor trait and the context handed to it on every step.
//!
//! A predictor is the external collaborator that turns the visible context of
//! a served date into one prediction per expected target. It owns whatever
//! state it needs across steps (fitted models, RNG seeds, rolling buffers) and
//! receives `&mut self` on every call, in ascending date order.

use crate::registry::TargetRegistry;
use crate::source::LaggedLabelRow;
use crate::types::{DateId, FeatureBatch, PredictionVector, TargetIndex};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Wall-clock position of the run when a step starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStatus {
    /// Time spent since the run started.
    pub elapsed: Duration,
    /// Time left before the budget runs out; `None` when unlimited.
    pub remaining: Option<Duration>,
}

impl BudgetStatus {
    /// Status for a run without a time limit.
    pub const fn unlimited(elapsed: Duration) -> Self {
        Self {
            elapsed,
            remaining: None,
        }
    }

    /// Whether less than `threshold` is left. Never true when unlimited.
    ///
    /// Predictors use this to degrade gracefully (e.g. skip a refit).
    pub fn is_tight(&self, threshold: Duration) -> bool {
        self.remaining.is_some_and(|r| r < threshold)
    }
}

/// A validated prediction recorded for a served date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPrediction {
    /// Served date.
    pub date_id: DateId,
    /// Validated predictions.
    pub values: PredictionVector,
}

/// Lagged label rows exposed on earlier steps, in the order they were served.
#[derive(Debug, Clone, Default)]
pub struct LabelHistory {
    rows: Vec<(DateId, LaggedLabelRow)>,
}

impl LabelHistory {
    /// Creates an empty history.
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Records a row exposed on `served`.
    pub fn push(&mut self, served: DateId, row: LaggedLabelRow) {
        self.rows.push((served, row));
    }

    /// Number of recorded rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing has been exposed yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(served date, row)` pairs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (DateId, &LaggedLabelRow)> {
        self.rows.iter().map(|(d, r)| (*d, r))
    }

    /// Latest label date described by any recorded row.
    pub fn max_label_date_id(&self) -> Option<DateId> {
        self.rows.iter().map(|(_, r)| r.label_date_id).max()
    }

    /// Most recent finite value released for `target`, with its label date.
    /// Among rows describing the same label date, the last served wins.
    pub fn latest(&self, target: TargetIndex) -> Option<(DateId, f64)> {
        self.rows
            .iter()
            .filter_map(|(_, r)| {
                r.values
                    .get(target)
                    .filter(|v| v.is_finite())
                    .map(|v| (r.label_date_id, v))
            })
            .max_by_key(|(label_date_id, _)| *label_date_id)
    }

    /// Label series for `target`, ordered by label date.
    pub fn series(&self, target: TargetIndex) -> Vec<(DateId, f64)> {
        let mut series: Vec<(DateId, f64)> = self
            .rows
            .iter()
            .filter_map(|(_, r)| r.values.get(target).map(|v| (r.label_date_id, v)))
            .collect();
        series.sort_by_key(|(d, _)| *d);
        series
    }
}

/// Everything a predictor may see when predicting for `date_id`.
#[derive(Debug)]
pub struct PredictionContext<'a> {
    /// Served date being predicted.
    pub date_id: DateId,
    /// Zero-based step number.
    pub step: usize,
    /// Targets the prediction must cover, no more and no less.
    pub expected: &'a BTreeSet<TargetIndex>,
    /// Target definitions.
    pub registry: &'a TargetRegistry,
    /// Feature rows at or before the cutoff for this date.
    pub features: &'a FeatureBatch,
    /// Lagged label rows released today, ordered by lag.
    pub lagged: &'a [LaggedLabelRow],
    /// Rows released on earlier steps, including withheld rows that have
    /// since become visible.
    pub history: &'a LabelHistory,
    /// Predictions recorded on earlier steps.
    pub previous: &'a [RecordedPrediction],
    /// Time budget position.
    pub budget: BudgetStatus,
}

impl PredictionContext<'_> {
    /// Latest label date visible anywhere in the context.
    pub fn max_visible_label_date_id(&self) -> Option<DateId> {
        self.lagged
            .iter()
            .map(|r| r.label_date_id)
            .chain(self.history.max_label_date_id())
            .max()
    }

    /// Value released today for `target`, from the lowest lag that has it.
    pub fn released_label(&self, target: TargetIndex) -> Option<f64> {
        self.lagged.iter().find_map(|r| r.values.get(target))
    }
}

/// Produces predictions for served dates, one call per date, in order.
///
/// Closures with the matching signature implement this trait, which keeps
/// ad-hoc predictors short.
///
/// # Example
///
/// ```
/// use solera_traits::{PredictionContext, PredictionVector, Predictor, Result};
///
/// struct Zero;
///
/// impl Predictor for Zero {
///     fn predict(&mut self, ctx: &PredictionContext<'_>) -> Result<PredictionVector> {
///         Ok(PredictionVector::filled(ctx.expected.iter().copied(), 0.0))
///     }
/// }
/// ```
pub trait Predictor: Send {
    /// Name used in logs and reports.
    fn name(&self) -> &str {
        "predictor"
    }

    /// Predicts every expected target for `ctx.date_id`.
    ///
    /// # Errors
    ///
    /// Any error aborts the run; the loop reports it as a predictor failure
    /// tagged with the served date.
    fn predict(&mut self, ctx: &PredictionContext<'_>) -> Result<PredictionVector>;
}

impl<F> Predictor for F
where
    F: FnMut(&PredictionContext<'_>) -> Result<PredictionVector> + Send,
{
    fn predict(&mut self, ctx: &PredictionContext<'_>) -> Result<PredictionVector> {
        self(ctx)
    }
}
