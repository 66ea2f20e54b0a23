//! The sequential evaluation loop.
//!
//! A run serves an ordered calendar of dates, one step per date. Each step
//! assembles the context visible on that date, asks the predictor for one
//! value per expected target, validates the shape of the answer and records
//! it. Steps never overlap and never revisit a date.

use crate::budget::TimeBudget;
use crate::config::SimulationConfig;
use crate::context::{expected_targets, released_labels, visible_features};
use crate::output::OutputTable;
use crate::validate::{quality_warning, validate_shape};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solera_eval::{Evaluation, align, evaluate};
use solera_traits::{
    DateId, DateTable, FeatureSource, LabelHistory, LaggedLabelRow, LaggedLabelSource,
    PredictionContext, Predictor, RecordedPrediction, Result, SoleraError, TargetRegistry,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Lifecycle of a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet run.
    Init,
    /// Serving `date_id` as step `step`.
    Stepping {
        /// Date being served.
        date_id: DateId,
        /// Zero-based step number.
        step: usize,
    },
    /// Every date was served.
    Done,
    /// The run stopped on a fatal error.
    Error {
        /// Date the run stopped on.
        date_id: DateId,
        /// Rendered error.
        message: String,
    },
}

impl LoopState {
    /// Whether the loop can no longer make progress.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// Result of an offline run scored against realised labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Predictor name
    pub predictor: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When scoring finished
    pub finished_at: DateTime<Utc>,
    /// Served dates
    pub days: usize,
    /// Days with non-finite predictions
    pub quality_warnings: usize,
    /// IC-Sharpe evaluation of the output table
    pub evaluation: Evaluation,
}

/// Drives a predictor over a calendar without leaking future labels.
pub struct SequentialEvaluationLoop<L, F, P> {
    dates: Vec<DateId>,
    registry: Arc<TargetRegistry>,
    labels: L,
    features: F,
    predictor: P,
    config: SimulationConfig,
    state: LoopState,
    output: OutputTable,
    history: LabelHistory,
    pending: Vec<LaggedLabelRow>,
}

impl<L, F, P> fmt::Debug for SequentialEvaluationLoop<L, F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialEvaluationLoop")
            .field("dates", &self.dates.len())
            .field("targets", &self.registry.len())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("recorded", &self.output.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl<L, F, P> SequentialEvaluationLoop<L, F, P>
where
    L: LaggedLabelSource,
    F: FeatureSource,
    P: Predictor,
{
    /// Creates a loop over `dates`.
    ///
    /// # Errors
    ///
    /// Returns [`SoleraError::InvalidData`] when `dates` is empty or not
    /// strictly increasing, and [`SoleraError::Config`] for an unusable
    /// configuration.
    pub fn new(
        dates: Vec<DateId>,
        registry: Arc<TargetRegistry>,
        labels: L,
        features: F,
        predictor: P,
        config: SimulationConfig,
    ) -> Result<Self> {
        if dates.is_empty() {
            return Err(SoleraError::InvalidData(
                "calendar has no dates to serve".to_string(),
            ));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SoleraError::InvalidData(format!(
                "calendar must be strictly increasing: {} followed by {}",
                pair[0], pair[1]
            )));
        }
        config.validate()?;

        Ok(Self {
            dates,
            registry,
            labels,
            features,
            predictor,
            config,
            state: LoopState::Init,
            output: OutputTable::new(),
            history: LabelHistory::new(),
            pending: Vec::new(),
        })
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    /// Rows recorded so far. After a failed run these are the completed
    /// steps, kept for diagnostics.
    pub const fn output(&self) -> &OutputTable {
        &self.output
    }

    /// The served calendar.
    pub fn dates(&self) -> &[DateId] {
        &self.dates
    }

    /// The predictor, with whatever state it accumulated.
    pub const fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Serves every date once, in order.
    ///
    /// # Errors
    ///
    /// - [`SoleraError::InvalidState`] if the loop already ran
    /// - [`SoleraError::BudgetExhausted`] when the time limit is reached
    ///   between steps
    /// - [`SoleraError::PredictorFailure`] when the predictor errors
    /// - [`SoleraError::ShapeMismatch`] when a prediction misses or adds targets
    ///
    /// A failed run returns no table; [`Self::output`] still shows the
    /// completed steps.
    pub fn run(&mut self) -> Result<OutputTable> {
        if self.state != LoopState::Init {
            return Err(SoleraError::InvalidState(format!(
                "run called in state {:?}",
                self.state
            )));
        }

        let budget = TimeBudget::start(self.config.time_budget()?);
        info!(
            predictor = self.predictor.name(),
            days = self.dates.len(),
            first = self.dates[0],
            last = self.dates[self.dates.len() - 1],
            "starting sequential evaluation"
        );

        for step in 0..self.dates.len() {
            let date_id = self.dates[step];

            if budget.is_exhausted() {
                warn!(date_id, completed = step, "time budget exhausted");
                return Err(self.fail(
                    date_id,
                    SoleraError::BudgetExhausted {
                        date_id,
                        completed: step,
                    },
                ));
            }

            self.state = LoopState::Stepping { date_id, step };
            if let Err(e) = self.step(date_id, step, &budget) {
                return Err(self.fail(date_id, e));
            }
        }

        self.state = LoopState::Done;
        info!(
            days = self.output.len(),
            quality_warnings = self.output.warnings().len(),
            elapsed_ms = budget.elapsed().as_millis() as u64,
            "sequential evaluation finished"
        );
        Ok(self.output.clone())
    }

    /// Runs the loop, then scores the output against `truth`.
    ///
    /// Both tables are restricted to their common targets before scoring.
    pub fn run_offline(&mut self, truth: &DateTable) -> Result<OfflineReport> {
        let started_at = Utc::now();
        let output = self.run()?;

        let predictions = output.to_date_table()?;
        let (truth, predictions) = align(truth, &predictions)?;
        let evaluation = evaluate(&truth, &predictions, &self.config.metrics)?;
        info!(
            sharpe = evaluation.summary.sharpe,
            scored_days = evaluation.summary.days,
            excluded_days = evaluation.daily.excluded.len(),
            "offline evaluation scored"
        );

        Ok(OfflineReport {
            predictor: self.predictor.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            days: output.len(),
            quality_warnings: output.warnings().len(),
            evaluation,
        })
    }

    fn step(&mut self, date_id: DateId, step: usize, budget: &TimeBudget) -> Result<()> {
        self.release_pending(date_id);

        let features = visible_features(&self.features, date_id)?;
        let released = released_labels(&self.labels, date_id, &self.config.lags)?;
        let expected = expected_targets(self.config.schema, &self.registry, &released)?;

        let ctx = PredictionContext {
            date_id,
            step,
            expected: &expected,
            registry: &self.registry,
            features: &features,
            lagged: &released.visible,
            history: &self.history,
            previous: self.output.rows(),
            budget: budget.status(),
        };
        let prediction =
            self.predictor
                .predict(&ctx)
                .map_err(|e| SoleraError::PredictorFailure {
                    date_id,
                    source: Box::new(e),
                })?;

        validate_shape(date_id, &expected, &prediction)?;
        if let Some(warning) = quality_warning(date_id, &prediction) {
            warn!(
                date_id,
                non_finite = warning.non_finite,
                "prediction contains non-finite values"
            );
            self.output.warn(warning);
        }

        self.output.push(RecordedPrediction {
            date_id,
            values: prediction,
        })?;
        for row in released.visible {
            self.history.push(date_id, row);
        }
        let withheld_count = released.withheld.len();
        self.pending.extend(released.withheld);

        debug!(
            date_id,
            step,
            targets = expected.len(),
            withheld = withheld_count,
            "step recorded"
        );
        Ok(())
    }

    /// Moves withheld rows that are knowable on `date_id` into the history.
    fn release_pending(&mut self, date_id: DateId) {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|row| row.visible_at(date_id));
        self.pending = waiting;
        for row in ready {
            debug!(
                date_id,
                lag = row.lag,
                label_date_id = row.label_date_id,
                "releasing previously withheld labels"
            );
            self.history.push(date_id, row);
        }
    }

    fn fail(&mut self, date_id: DateId, err: SoleraError) -> SoleraError {
        error!(date_id, error = %err, "sequential evaluation stopped");
        self.state = LoopState::Error {
            date_id,
            message: err.to_string(),
        };
        err
    }
}
