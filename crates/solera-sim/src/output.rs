//! Output table accumulated by the loop.

use crate::validate::QualityWarning;
use serde::{Deserialize, Serialize};
use solera_traits::{DateId, DateTable, RecordedPrediction, Result, SoleraError, TargetIndex};
use std::collections::BTreeSet;

/// Validated predictions in served order, one row per date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputTable {
    rows: Vec<RecordedPrediction>,
    warnings: Vec<QualityWarning>,
}

impl OutputTable {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Appends a row. Dates must be strictly increasing.
    pub fn push(&mut self, row: RecordedPrediction) -> Result<()> {
        if let Some(last) = self.rows.last() {
            if row.date_id <= last.date_id {
                return Err(SoleraError::InvalidData(format!(
                    "row for date {} appended after date {}",
                    row.date_id, last.date_id
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Records a quality warning.
    pub fn warn(&mut self, warning: QualityWarning) {
        self.warnings.push(warning);
    }

    /// Rows in served order.
    pub fn rows(&self) -> &[RecordedPrediction] {
        &self.rows
    }

    /// Quality warnings in served order.
    pub fn warnings(&self) -> &[QualityWarning] {
        &self.warnings
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row was recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Served dates, ascending.
    pub fn date_ids(&self) -> Vec<DateId> {
        self.rows.iter().map(|r| r.date_id).collect()
    }

    /// Row recorded for `date_id`.
    pub fn get(&self, date_id: DateId) -> Option<&RecordedPrediction> {
        self.rows
            .binary_search_by_key(&date_id, |r| r.date_id)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Canonical column order: every target predicted on any day, by index.
    pub fn targets(&self) -> Vec<TargetIndex> {
        self.rows
            .iter()
            .flat_map(|r| r.values.targets())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Dense table over [`Self::targets`]. Targets absent on a day are NaN.
    pub fn to_date_table(&self) -> Result<DateTable> {
        DateTable::from_vectors(
            self.targets(),
            self.rows.iter().map(|r| (r.date_id, r.values.clone())),
        )
    }
}
