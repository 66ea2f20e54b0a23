//! Feature file access and the served calendar.

use crate::frame::{date_ids, read_csv};
use polars::prelude::*;
use solera_traits::types::DATE_ID_COLUMN;
use solera_traits::{DateId, FeatureBatch, FeatureSource, Result, SoleraError};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Unique `date_id`s of a frame, in first-seen order.
pub fn calendar(df: &DataFrame) -> Result<Vec<DateId>> {
    let mut seen = HashSet::new();
    Ok(date_ids(df)?
        .into_iter()
        .filter(|d| seen.insert(*d))
        .collect())
}

/// Features served by the test feed, kept in memory.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    data: DataFrame,
    lookback: Option<DateId>,
}

impl FeatureTable {
    /// Wraps a frame that has a `date_id` column.
    pub fn new(data: DataFrame) -> Result<Self> {
        if !data
            .get_columns()
            .iter()
            .any(|c| c.name().as_str() == DATE_ID_COLUMN)
        {
            return Err(SoleraError::MissingColumn(DATE_ID_COLUMN.to_string()));
        }
        Ok(Self {
            data,
            lookback: None,
        })
    }

    /// Loads a feature CSV such as `test.csv`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::new(read_csv(path)?)?;
        info!(
            path = %path.display(),
            rows = table.data.height(),
            columns = table.data.width(),
            "loaded features"
        );
        Ok(table)
    }

    /// Serves only the last `days` dates up to and including the served one.
    ///
    /// Without a lookback every row is served and the loop's cutoff alone
    /// decides visibility.
    pub fn with_lookback(mut self, days: DateId) -> Self {
        self.lookback = Some(days.max(1));
        self
    }

    /// Served calendar, in first-seen order.
    pub fn calendar(&self) -> Result<Vec<DateId>> {
        calendar(&self.data)
    }

    /// The full frame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }
}

impl FeatureSource for FeatureTable {
    fn features(&self, date_id: DateId) -> Result<FeatureBatch> {
        let Some(days) = self.lookback else {
            return Ok(FeatureBatch::new(self.data.clone()));
        };
        let window = self
            .data
            .clone()
            .lazy()
            .filter(
                col(DATE_ID_COLUMN)
                    .gt(lit(date_id - days))
                    .and(col(DATE_ID_COLUMN).lt_eq(lit(date_id))),
            )
            .collect()?;
        Ok(FeatureBatch::new(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("date_id".into(), vec![5i64, 5, 3, 4, 4, 6]),
            Column::new("x".into(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]),
        ])
        .unwrap()
    }

    #[test]
    fn test_calendar_first_seen_order() {
        assert_eq!(calendar(&frame()).unwrap(), vec![5, 3, 4, 6]);
    }

    #[test]
    fn test_requires_date_column() {
        let df = DataFrame::new(vec![Column::new("x".into(), vec![1.0])]).unwrap();
        assert!(matches!(
            FeatureTable::new(df),
            Err(SoleraError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_lookback_window() {
        let table = FeatureTable::new(frame()).unwrap().with_lookback(2);
        let batch = table.features(5).unwrap();
        let mut dates: Vec<_> = batch.date_ids().unwrap().into_iter().flatten().collect();
        dates.sort_unstable();
        assert_eq!(dates, vec![4, 4, 5, 5]);
    }

    #[test]
    fn test_without_lookback_serves_everything() {
        let table = FeatureTable::new(frame()).unwrap();
        assert_eq!(table.features(3).unwrap().len(), 6);
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "date_id,is_scored,x\n7,true,0.1\n7,true,0.2\n8,false,0.3\n").unwrap();

        let table = FeatureTable::load(&path).unwrap();
        assert_eq!(table.calendar().unwrap(), vec![7, 8]);
        assert_eq!(table.data().height(), 3);
    }
}
