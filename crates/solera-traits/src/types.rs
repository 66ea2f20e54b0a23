//! Common types used throughout the solera framework.
//!
//! This module defines the identifiers for served dates and targets, the
//! per-date value vectors exchanged between the loop, the predictor and the
//! metric engine, and the feature batch container.

use crate::{Result, SoleraError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A served trading/calendar day. Strictly increasing across a calendar.
pub type DateId = i64;

/// Index of a target in the registry (`0..n`).
pub type TargetIndex = usize;

/// Name of the date column shared by every tabular input.
pub const DATE_ID_COLUMN: &str = "date_id";

/// Name of the column holding the date a lagged label describes.
pub const LABEL_DATE_ID_COLUMN: &str = "label_date_id";

const TARGET_COLUMN_PREFIX: &str = "target_";

/// Canonical column name for a target index (`target_{index}`).
pub fn target_column(index: TargetIndex) -> String {
    format!("{TARGET_COLUMN_PREFIX}{index}")
}

/// Parse a canonical target column name back into its index.
///
/// # Examples
///
/// ```
/// use solera_traits::types::parse_target_column;
///
/// assert_eq!(parse_target_column("target_17"), Some(17));
/// assert_eq!(parse_target_column("date_id"), None);
/// ```
pub fn parse_target_column(name: &str) -> Option<TargetIndex> {
    name.strip_prefix(TARGET_COLUMN_PREFIX)?.parse().ok()
}

/// Values keyed by target index for exactly one date.
///
/// Used both for true labels and for predictions. Entries may be non-finite
/// (missing); iteration is always in ascending target order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetValues {
    values: BTreeMap<TargetIndex, f64>,
}

/// True labels for one date.
pub type LabelVector = TargetValues;

/// Predictions for one date.
pub type PredictionVector = TargetValues;

impl TargetValues {
    /// Creates an empty vector.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Creates a vector holding `value` for every given target.
    pub fn filled<I>(targets: I, value: f64) -> Self
    where
        I: IntoIterator<Item = TargetIndex>,
    {
        targets.into_iter().map(|t| (t, value)).collect()
    }

    /// Sets the value for a target, returning the previous one.
    pub fn insert(&mut self, target: TargetIndex, value: f64) -> Option<f64> {
        self.values.insert(target, value)
    }

    /// Removes a target, returning its value.
    pub fn remove(&mut self, target: TargetIndex) -> Option<f64> {
        self.values.remove(&target)
    }

    /// Value for a target, if present.
    pub fn get(&self, target: TargetIndex) -> Option<f64> {
        self.values.get(&target).copied()
    }

    /// Whether the target has an entry (finite or not).
    pub fn contains(&self, target: TargetIndex) -> bool {
        self.values.contains_key(&target)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Target indices in ascending order.
    pub fn targets(&self) -> impl Iterator<Item = TargetIndex> + '_ {
        self.values.keys().copied()
    }

    /// Target indices as a set.
    pub fn target_set(&self) -> BTreeSet<TargetIndex> {
        self.values.keys().copied().collect()
    }

    /// `(target, value)` pairs in ascending target order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetIndex, f64)> + '_ {
        self.values.iter().map(|(&t, &v)| (t, v))
    }

    /// Number of entries that are NaN or infinite.
    pub fn non_finite_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_finite()).count()
    }

    /// Dense vector over `order`; absent targets become NaN.
    pub fn to_dense(&self, order: &[TargetIndex]) -> Vec<f64> {
        order
            .iter()
            .map(|t| self.get(*t).unwrap_or(f64::NAN))
            .collect()
    }
}

impl FromIterator<(TargetIndex, f64)> for TargetValues {
    fn from_iter<I: IntoIterator<Item = (TargetIndex, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TargetValues {
    type Item = (TargetIndex, f64);
    type IntoIter = std::collections::btree_map::IntoIter<TargetIndex, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Container for the feature rows served alongside a date.
///
/// `FeatureBatch` wraps a Polars DataFrame. Apart from a `date_id` column the
/// schema is opaque to the harness: features are the predictor's business.
#[derive(Debug, Clone, Default)]
pub struct FeatureBatch {
    data: DataFrame,
}

impl FeatureBatch {
    /// Creates a new batch from a DataFrame.
    pub const fn new(data: DataFrame) -> Self {
        Self { data }
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Checks if a column exists in the batch.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.data.column(name).ok()
    }

    /// The `date_id` of every row. Nulls stay `None`.
    pub fn date_ids(&self) -> Result<Vec<Option<DateId>>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if !self.has_column(DATE_ID_COLUMN) {
            return Err(SoleraError::MissingColumn(DATE_ID_COLUMN.to_string()));
        }
        let series = self
            .data
            .column(DATE_ID_COLUMN)?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        Ok(series.i64()?.into_iter().collect())
    }

    /// Latest `date_id` present in the batch.
    pub fn max_date_id(&self) -> Result<Option<DateId>> {
        Ok(self.date_ids()?.into_iter().flatten().max())
    }

    /// Keeps only the rows whose `date_id` is at or before `cutoff`.
    ///
    /// Rows with a null `date_id` cannot be placed in time and are dropped.
    pub fn up_to(&self, cutoff: DateId) -> Result<Self> {
        if self.is_empty() {
            return Ok(self.clone());
        }
        let mask = self
            .date_ids()?
            .into_iter()
            .map(|d| d.is_some_and(|d| d <= cutoff))
            .collect::<BooleanChunked>();
        Ok(Self::new(self.data.filter(&mask)?))
    }
}

impl From<DataFrame> for FeatureBatch {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}

impl AsRef<DataFrame> for FeatureBatch {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_column_round_trip() {
        assert_eq!(target_column(0), "target_0");
        assert_eq!(parse_target_column("target_423"), Some(423));
        assert_eq!(parse_target_column("target_x"), None);
        assert_eq!(parse_target_column("label_date_id"), None);
    }

    #[test]
    fn test_target_values_ordering() {
        let values: TargetValues = [(3, 0.3), (1, 0.1), (2, f64::NAN)].into_iter().collect();
        assert_eq!(values.targets().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(values.non_finite_count(), 1);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_target_values_to_dense() {
        let values: TargetValues = [(0, 1.0), (2, 3.0)].into_iter().collect();
        let dense = values.to_dense(&[0, 1, 2]);
        assert_eq!(dense[0], 1.0);
        assert!(dense[1].is_nan());
        assert_eq!(dense[2], 3.0);
    }

    #[test]
    fn test_filled() {
        let zeros = TargetValues::filled(0..4, 0.0);
        assert_eq!(zeros.len(), 4);
        assert!(zeros.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_feature_batch_up_to() {
        let df = df! {
            "date_id" => &[1i64, 2, 3, 4],
            "price" => &[10.0, 11.0, 12.0, 13.0],
        }
        .unwrap();
        let batch = FeatureBatch::new(df);

        let visible = batch.up_to(2).unwrap();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible.max_date_id().unwrap(), Some(2));
    }

    #[test]
    fn test_feature_batch_missing_date_column() {
        let df = df! { "price" => &[10.0] }.unwrap();
        let batch = FeatureBatch::new(df);
        assert!(matches!(
            batch.up_to(5),
            Err(SoleraError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_empty_feature_batch() {
        let batch = FeatureBatch::default();
        assert!(batch.is_empty());
        assert!(batch.up_to(10).unwrap().is_empty());
        assert_eq!(batch.max_date_id().unwrap(), None);
    }
}
