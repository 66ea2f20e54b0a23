//! Lagged labels replayed from a full label table.
//!
//! Offline backtests have the complete label history up front. Replaying it
//! through [`LabelReplay`] serves exactly what the live feed would have: on
//! served date `t`, lag `k` releases the labels of the lag-`k` targets for
//! `t - k - 1`.

use solera_traits::{
    DateId, DateTable, LaggedLabelRow, LaggedLabelSource, Result, TargetIndex, TargetRegistry,
};
use std::collections::BTreeMap;

/// [`LaggedLabelSource`] backed by a complete label table.
#[derive(Debug, Clone)]
pub struct LabelReplay {
    labels: DateTable,
    by_lag: BTreeMap<u32, Vec<TargetIndex>>,
}

impl LabelReplay {
    /// Groups the table's targets by their registered lag.
    ///
    /// # Errors
    ///
    /// Returns [`solera_traits::SoleraError::UnknownTarget`] when a column of
    /// `labels` is not in the registry.
    pub fn new(labels: DateTable, registry: &TargetRegistry) -> Result<Self> {
        registry.check_known(labels.targets().iter().copied())?;

        let mut by_lag: BTreeMap<u32, Vec<TargetIndex>> = BTreeMap::new();
        for &index in labels.targets() {
            if let Some(target) = registry.get(index) {
                by_lag.entry(target.lag).or_default().push(index);
            }
        }

        Ok(Self { labels, by_lag })
    }

    /// Date described by lag `lag` on served date `date_id`.
    pub fn label_date(date_id: DateId, lag: u32) -> DateId {
        date_id - i64::from(lag) - 1
    }

    /// Lags with at least one target.
    pub fn lags(&self) -> Vec<u32> {
        self.by_lag.keys().copied().collect()
    }

    /// The underlying label table.
    pub const fn labels(&self) -> &DateTable {
        &self.labels
    }
}

impl LaggedLabelSource for LabelReplay {
    fn lagged_labels(&self, date_id: DateId, lag: u32) -> Result<Option<LaggedLabelRow>> {
        let Some(targets) = self.by_lag.get(&lag) else {
            return Ok(None);
        };
        let label_date_id = Self::label_date(date_id, lag);
        if self.labels.row(label_date_id).is_none() {
            return Ok(None);
        }

        let values = targets
            .iter()
            .filter_map(|&t| self.labels.get(label_date_id, t).map(|v| (t, v)))
            .collect();
        Ok(Some(LaggedLabelRow {
            lag,
            label_date_id,
            values,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solera_traits::{Instruments, SoleraError, Target};

    fn registry() -> TargetRegistry {
        TargetRegistry::new(
            [(0, 1), (1, 2), (2, 1)]
                .into_iter()
                .map(|(index, lag)| Target {
                    index,
                    lag,
                    instruments: Instruments::Single(format!("asset_{index}")),
                })
                .collect(),
        )
        .unwrap()
    }

    fn labels() -> DateTable {
        DateTable::new(
            vec![0, 1, 2],
            (1..=10)
                .map(|d| (d, vec![d as f64, 10.0 * d as f64, -(d as f64)]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_replay_offsets() {
        let replay = LabelReplay::new(labels(), &registry()).unwrap();
        assert_eq!(replay.lags(), vec![1, 2]);

        let lag1 = replay.lagged_labels(8, 1).unwrap().unwrap();
        assert_eq!(lag1.label_date_id, 6);
        assert_eq!(lag1.values.targets().collect::<Vec<_>>(), vec![0, 2]);
        assert_relative_eq!(lag1.values.get(0).unwrap(), 6.0);

        let lag2 = replay.lagged_labels(8, 2).unwrap().unwrap();
        assert_eq!(lag2.label_date_id, 5);
        assert_relative_eq!(lag2.values.get(1).unwrap(), 50.0);
        assert_eq!(lag2.values.len(), 1);
    }

    #[test]
    fn test_replay_never_leaks() {
        let replay = LabelReplay::new(labels(), &registry()).unwrap();
        for t in 1..=12 {
            for lag in 1..=4 {
                if let Some(row) = replay.lagged_labels(t, lag).unwrap() {
                    assert!(row.visible_at(t));
                }
            }
        }
    }

    #[test]
    fn test_replay_before_history() {
        let replay = LabelReplay::new(labels(), &registry()).unwrap();
        assert!(replay.lagged_labels(2, 1).unwrap().is_none());
        assert!(replay.lagged_labels(8, 3).unwrap().is_none());
    }

    #[test]
    fn test_unknown_column() {
        let table = DateTable::new(vec![0, 9], vec![(1, vec![0.0, 0.0])]).unwrap();
        assert!(matches!(
            LabelReplay::new(table, &registry()),
            Err(SoleraError::UnknownTarget(9))
        ));
    }
}
