//! Visible context assembly.
//!
//! Everything a predictor sees on served date `t` goes through this module:
//! feature rows are cut at `t`, and lagged label rows describing `t` or later
//! are withheld. The expected target set is derived here too, since under
//! [`SchemaPolicy::ServedLabels`] it depends on what was served.

use crate::config::SchemaPolicy;
use solera_traits::{
    DateId, FeatureBatch, FeatureSource, LaggedLabelRow, LaggedLabelSource, Result, TargetIndex,
    TargetRegistry,
};
use std::collections::BTreeSet;
use tracing::warn;

/// Lagged label rows served on one date, split by visibility.
#[derive(Debug, Clone, Default)]
pub struct ReleasedLabels {
    /// Rows with `label_date_id < t`, ordered by lag.
    pub visible: Vec<LaggedLabelRow>,
    /// Rows that would leak the present or the future.
    pub withheld: Vec<LaggedLabelRow>,
}

impl ReleasedLabels {
    /// Whether the source served nothing at all.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.withheld.is_empty()
    }

    /// Union of the targets of every served row, withheld ones included.
    pub fn served_targets(&self) -> BTreeSet<TargetIndex> {
        self.visible
            .iter()
            .chain(&self.withheld)
            .flat_map(|row| row.values.targets())
            .collect()
    }
}

/// Feature rows served with `date_id`, cut at `date_id`.
pub fn visible_features<F>(source: &F, date_id: DateId) -> Result<FeatureBatch>
where
    F: FeatureSource + ?Sized,
{
    source.features(date_id)?.up_to(date_id)
}

/// Collects the lagged label rows released on `date_id`.
///
/// Rows whose `label_date_id` is not strictly before `date_id` are moved to
/// [`ReleasedLabels::withheld`] and logged.
pub fn released_labels<L>(source: &L, date_id: DateId, lags: &[u32]) -> Result<ReleasedLabels>
where
    L: LaggedLabelSource + ?Sized,
{
    let mut released = ReleasedLabels::default();
    let mut lags = lags.to_vec();
    lags.sort_unstable();

    for lag in lags {
        let Some(row) = source.lagged_labels(date_id, lag)? else {
            continue;
        };
        if row.visible_at(date_id) {
            released.visible.push(row);
        } else {
            warn!(
                date_id,
                lag,
                label_date_id = row.label_date_id,
                "withholding lagged labels that are not yet knowable"
            );
            released.withheld.push(row);
        }
    }

    Ok(released)
}

/// Targets the prediction for `date_id` must cover.
///
/// # Errors
///
/// Returns [`solera_traits::SoleraError::UnknownTarget`] when a served row
/// names a target outside the registry.
pub fn expected_targets(
    policy: SchemaPolicy,
    registry: &TargetRegistry,
    released: &ReleasedLabels,
) -> Result<BTreeSet<TargetIndex>> {
    match policy {
        SchemaPolicy::Registry => Ok(registry.index_set()),
        SchemaPolicy::ServedLabels if released.is_empty() => Ok(registry.index_set()),
        SchemaPolicy::ServedLabels => {
            let served = released.served_targets();
            registry.check_known(served.iter().copied())?;
            Ok(served)
        }
    }
}
