//! Date-indexed tables over a fixed target ordering.
//!
//! A [`DateTable`] maps each `DateId` to a fixed-length vector of `f64`, one
//! entry per target, in one ordering shared by every row. Both the true-label
//! table and the prediction table handed to the metric engine use this shape.

use crate::registry::TargetRegistry;
use crate::types::{DateId, TargetIndex, TargetValues};
use crate::{Result, SoleraError};
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::{BTreeSet, HashMap};

/// Rows of values keyed by date, columns keyed by target index.
///
/// Rows are stored sorted by date. Construction validates the target ordering
/// (no duplicates), the dates (no duplicates) and the row lengths once, so
/// readers never need to re-check shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTable {
    targets: Vec<TargetIndex>,
    dates: Vec<DateId>,
    values: Array2<f64>,
}

impl DateTable {
    /// Builds a table from dense rows ordered like `targets`.
    ///
    /// # Errors
    ///
    /// Returns [`SoleraError::InvalidData`] for duplicate targets, duplicate
    /// dates or rows whose length differs from `targets.len()`.
    pub fn new(targets: Vec<TargetIndex>, mut rows: Vec<(DateId, Vec<f64>)>) -> Result<Self> {
        let unique: BTreeSet<_> = targets.iter().copied().collect();
        if unique.len() != targets.len() {
            return Err(SoleraError::InvalidData(
                "duplicate target index in table columns".to_string(),
            ));
        }

        rows.sort_by_key(|(date_id, _)| *date_id);
        if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(SoleraError::InvalidData(format!(
                "duplicate date_id {} in table",
                pair[0].0
            )));
        }

        let width = targets.len();
        let mut flat = Vec::with_capacity(rows.len() * width);
        let mut dates = Vec::with_capacity(rows.len());
        for (date_id, row) in rows {
            if row.len() != width {
                return Err(SoleraError::InvalidData(format!(
                    "row for date_id {date_id} has {} values, expected {width}",
                    row.len()
                )));
            }
            dates.push(date_id);
            flat.extend(row);
        }

        let values = Array2::from_shape_vec((dates.len(), width), flat)
            .map_err(|e| SoleraError::InvalidData(e.to_string()))?;

        Ok(Self {
            targets,
            dates,
            values,
        })
    }

    /// Builds a table and checks every column against the registry.
    pub fn with_registry(
        registry: &TargetRegistry,
        targets: Vec<TargetIndex>,
        rows: Vec<(DateId, Vec<f64>)>,
    ) -> Result<Self> {
        registry.check_known(targets.iter().copied())?;
        Self::new(targets, rows)
    }

    /// Builds a table from sparse per-date vectors. Missing entries become NaN.
    pub fn from_vectors<I>(targets: Vec<TargetIndex>, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DateId, TargetValues)>,
    {
        let dense = rows
            .into_iter()
            .map(|(date_id, values)| (date_id, values.to_dense(&targets)))
            .collect();
        Self::new(targets, dense)
    }

    /// Column ordering.
    pub fn targets(&self) -> &[TargetIndex] {
        &self.targets
    }

    /// Dates in ascending order.
    pub fn dates(&self) -> &[DateId] {
        &self.dates
    }

    /// The underlying `dates x targets` matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row for a date.
    pub fn row(&self, date_id: DateId) -> Option<ArrayView1<'_, f64>> {
        self.dates
            .binary_search(&date_id)
            .ok()
            .map(|i| self.values.row(i))
    }

    /// Row for a date as a sparse vector.
    pub fn row_values(&self, date_id: DateId) -> Option<TargetValues> {
        self.row(date_id).map(|row| {
            self.targets
                .iter()
                .copied()
                .zip(row.iter().copied())
                .collect()
        })
    }

    /// Single cell lookup.
    pub fn get(&self, date_id: DateId, target: TargetIndex) -> Option<f64> {
        let column = self.targets.iter().position(|&t| t == target)?;
        self.row(date_id).map(|row| row[column])
    }

    /// `(date, row)` pairs in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (DateId, ArrayView1<'_, f64>)> {
        self.dates
            .iter()
            .copied()
            .zip(self.values.axis_iter(Axis(0)))
    }

    /// Whether both tables use the identical column ordering.
    pub fn same_targets(&self, other: &Self) -> bool {
        self.targets == other.targets
    }

    /// Dates present in both tables, ascending.
    pub fn common_dates(&self, other: &Self) -> Vec<DateId> {
        self.dates
            .iter()
            .copied()
            .filter(|d| other.dates.binary_search(d).is_ok())
            .collect()
    }

    /// Targets present in both tables, in this table's order.
    pub fn common_targets(&self, other: &Self) -> Vec<TargetIndex> {
        let theirs: BTreeSet<_> = other.targets.iter().copied().collect();
        self.targets
            .iter()
            .copied()
            .filter(|t| theirs.contains(t))
            .collect()
    }

    /// Projects the table onto `targets`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`SoleraError::TableMismatch`] if a requested target is not a
    /// column of this table.
    pub fn select_targets(&self, targets: &[TargetIndex]) -> Result<Self> {
        let positions: HashMap<TargetIndex, usize> = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, i))
            .collect();
        let columns = targets
            .iter()
            .map(|t| {
                positions.get(t).copied().ok_or_else(|| {
                    SoleraError::TableMismatch(format!("target {t} is not a column of the table"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            targets: targets.to_vec(),
            dates: self.dates.clone(),
            values: self.values.select(Axis(1), &columns),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DateTable {
        DateTable::new(
            vec![0, 1, 2],
            vec![(11, vec![4.0, 5.0, 6.0]), (10, vec![1.0, 2.0, 3.0])],
        )
        .unwrap()
    }

    #[test]
    fn test_rows_sorted_by_date() {
        let table = sample();
        assert_eq!(table.dates(), &[10, 11]);
        assert_eq!(table.row(10).unwrap()[0], 1.0);
        assert_eq!(table.get(11, 2), Some(6.0));
        assert!(table.row(12).is_none());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = DateTable::new(vec![0, 1], vec![(1, vec![1.0])]);
        assert!(matches!(result, Err(SoleraError::InvalidData(_))));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = DateTable::new(vec![0], vec![(1, vec![1.0]), (1, vec![2.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_targets() {
        let result = DateTable::new(vec![0, 0], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_with_registry_rejects_unknown_target() {
        let registry = TargetRegistry::uniform(2, 1).unwrap();
        let result = DateTable::with_registry(&registry, vec![0, 5], vec![]);
        assert!(matches!(result, Err(SoleraError::UnknownTarget(5))));
    }

    #[test]
    fn test_from_vectors_fills_nan() {
        let row: TargetValues = [(0, 1.0)].into_iter().collect();
        let table = DateTable::from_vectors(vec![0, 1], vec![(3, row)]).unwrap();
        assert_eq!(table.get(3, 0), Some(1.0));
        assert!(table.get(3, 1).unwrap().is_nan());
    }

    #[test]
    fn test_common_dates_and_targets() {
        let a = sample();
        let b = DateTable::new(vec![2, 1], vec![(11, vec![0.0, 0.0]), (12, vec![0.0, 0.0])])
            .unwrap();
        assert_eq!(a.common_dates(&b), vec![11]);
        assert_eq!(a.common_targets(&b), vec![1, 2]);
        assert!(!a.same_targets(&b));
    }

    #[test]
    fn test_select_targets_reorders() {
        let table = sample().select_targets(&[2, 0]).unwrap();
        assert_eq!(table.targets(), &[2, 0]);
        assert_eq!(table.row(10).unwrap().to_vec(), vec![3.0, 1.0]);
        assert!(sample().select_targets(&[7]).is_err());
    }

    #[test]
    fn test_row_values() {
        let values = sample().row_values(11).unwrap();
        assert_eq!(values.get(1), Some(5.0));
        assert_eq!(values.len(), 3);
    }
}
