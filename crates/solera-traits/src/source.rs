//! Data capabilities consumed by the evaluation loop.
//!
//! The loop never reads files directly. It asks a [`LaggedLabelSource`] for
//! the labels released on a date and a [`FeatureSource`] for the feature rows
//! served with it, so storage (memory, files, a database) stays swappable.

use crate::types::{DateId, FeatureBatch, LabelVector};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labels of one lag released on a served date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaggedLabelRow {
    /// Horizon of the targets in this row.
    pub lag: u32,
    /// The date the labels describe.
    pub label_date_id: DateId,
    /// Label values keyed by target.
    pub values: LabelVector,
}

impl LaggedLabelRow {
    /// Whether the row only describes dates strictly before `date_id`.
    pub const fn visible_at(&self, date_id: DateId) -> bool {
        self.label_date_id < date_id
    }
}

/// Given a served date and a lag, returns the labels knowable on that date.
pub trait LaggedLabelSource: Send + Sync {
    /// The row for `(date_id, lag)`, or `None` when nothing is served.
    fn lagged_labels(&self, date_id: DateId, lag: u32) -> Result<Option<LaggedLabelRow>>;
}

/// Supplies the feature rows served alongside a date.
pub trait FeatureSource: Send + Sync {
    /// Feature rows for `date_id`. May include history; the loop applies the
    /// visibility cutoff itself.
    fn features(&self, date_id: DateId) -> Result<FeatureBatch>;
}

/// Feature source for runs that only consume lagged labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeatures;

impl FeatureSource for NoFeatures {
    fn features(&self, _date_id: DateId) -> Result<FeatureBatch> {
        Ok(FeatureBatch::default())
    }
}

/// In-memory lagged label rows keyed by served date and lag.
#[derive(Debug, Clone, Default)]
pub struct LaggedLabelStore {
    rows: BTreeMap<(DateId, u32), LaggedLabelRow>,
}

impl LaggedLabelStore {
    /// Creates an empty store.
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Registers the row served on `date_id`, replacing any previous one for
    /// the same lag.
    pub fn insert(&mut self, date_id: DateId, row: LaggedLabelRow) -> Option<LaggedLabelRow> {
        self.rows.insert((date_id, row.lag), row)
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Served dates with at least one row, ascending.
    pub fn served_dates(&self) -> Vec<DateId> {
        let mut dates: Vec<DateId> = self.rows.keys().map(|(d, _)| *d).collect();
        dates.dedup();
        dates
    }

    /// All rows for one served date, ordered by lag.
    pub fn rows_for(&self, date_id: DateId) -> impl Iterator<Item = &LaggedLabelRow> {
        self.rows
            .range((date_id, u32::MIN)..=(date_id, u32::MAX))
            .map(|(_, row)| row)
    }
}

impl LaggedLabelSource for LaggedLabelStore {
    fn lagged_labels(&self, date_id: DateId, lag: u32) -> Result<Option<LaggedLabelRow>> {
        Ok(self.rows.get(&(date_id, lag)).cloned())
    }
}
