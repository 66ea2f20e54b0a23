//! Label file loaders.
//!
//! Two layouts are supported. A wide label table has a `date_id` column and
//! one `target_N` column per target. A lagged label directory holds one file
//! per lag, `test_labels_lag_{k}.csv`, where each row is keyed by the served
//! `date_id` and describes `label_date_id`.

use crate::frame::{column_names, date_ids, f64_values, has_column, i64_values, read_csv};
use polars::prelude::DataFrame;
use solera_traits::types::{
    DATE_ID_COLUMN, LABEL_DATE_ID_COLUMN, parse_target_column, target_column,
};
use solera_traits::{
    DateId, DateTable, Instruments, LaggedLabelRow, LaggedLabelStore, Result, SoleraError, Target,
    TargetIndex, TargetRegistry, TargetValues,
};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the lagged label directory inside a data directory.
pub const LAGGED_LABEL_DIR: &str = "lagged_test_labels";

/// File holding the lag-`lag` labels inside a lagged label directory.
pub fn lagged_label_file(dir: impl AsRef<Path>, lag: u32) -> PathBuf {
    dir.as_ref().join(format!("test_labels_lag_{lag}.csv"))
}

/// Locates the lagged label directory for `data_dir`.
///
/// Looks in `<data_dir>/lagged_test_labels` first, then next to `data_dir`.
pub fn resolve_lagged_label_dir(data_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let data_dir = data_dir.as_ref();
    let inside = data_dir.join(LAGGED_LABEL_DIR);
    if inside.is_dir() {
        return Ok(inside);
    }
    if let Some(parent) = data_dir.parent() {
        let beside = parent.join(LAGGED_LABEL_DIR);
        if beside.is_dir() {
            debug!(path = %beside.display(), "using lagged labels next to the data directory");
            return Ok(beside);
        }
    }
    Err(SoleraError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("missing {}", inside.display()),
    )))
}

/// Target columns of `df`, in file order. Other non-date columns are skipped.
fn target_columns(df: &DataFrame) -> Vec<(String, TargetIndex)> {
    column_names(df)
        .into_iter()
        .filter(|name| name != DATE_ID_COLUMN && name != LABEL_DATE_ID_COLUMN)
        .filter_map(|name| match parse_target_column(&name) {
            Some(index) => Some((name, index)),
            None => {
                debug!(column = %name, "ignoring non-target column");
                None
            }
        })
        .collect()
}

/// Loads a wide label table.
///
/// When a registry is given, every target column must be registered.
pub fn load_label_table(
    path: impl AsRef<Path>,
    registry: Option<&TargetRegistry>,
) -> Result<DateTable> {
    let path = path.as_ref();
    let df = read_csv(path)?;
    let table = label_table_from_frame(&df, registry)?;
    info!(
        path = %path.display(),
        dates = table.len(),
        targets = table.targets().len(),
        "loaded label table"
    );
    Ok(table)
}

/// Converts a wide frame (`date_id` + `target_N` columns) into a table.
pub fn label_table_from_frame(
    df: &DataFrame,
    registry: Option<&TargetRegistry>,
) -> Result<DateTable> {
    let dates = date_ids(df)?;
    let columns = target_columns(df);
    if columns.is_empty() {
        return Err(SoleraError::MissingColumn("target_*".to_string()));
    }

    let values = columns
        .iter()
        .map(|(name, _)| f64_values(df, name))
        .collect::<Result<Vec<_>>>()?;
    let rows = dates
        .iter()
        .enumerate()
        .map(|(i, &date_id)| (date_id, values.iter().map(|column| column[i]).collect()))
        .collect();
    let targets: Vec<TargetIndex> = columns.into_iter().map(|(_, index)| index).collect();

    if let Some(registry) = registry {
        registry.check_known(targets.iter().copied())?;
    }
    DateTable::new(targets, rows)
}

/// Lagged labels loaded from a directory.
#[derive(Debug, Clone, Default)]
pub struct LaggedLabels {
    /// Rows keyed by served date and lag.
    pub store: LaggedLabelStore,
    /// Every target column seen, in lag order then file order, deduplicated.
    pub columns: Vec<TargetIndex>,
    /// Lag of the first file each target appeared in.
    pub first_lag: BTreeMap<TargetIndex, u32>,
}

impl LaggedLabels {
    /// Registry implied by the files when no registry file is available.
    ///
    /// Each target takes the lag of the first file it appears in and is named
    /// after its column. Fails when the columns are not contiguous from 0.
    pub fn inferred_registry(&self) -> Result<TargetRegistry> {
        TargetRegistry::new(
            self.first_lag
                .iter()
                .map(|(&index, &lag)| Target {
                    index,
                    lag,
                    instruments: Instruments::Single(target_column(index)),
                })
                .collect(),
        )
    }
}

/// Loads `test_labels_lag_{k}.csv` for each requested lag.
///
/// Missing files are skipped. A file without `label_date_id` describes
/// `date_id - lag - 1`.
///
/// # Errors
///
/// Fails when none of the files exist or none of them has a target column.
pub fn load_lagged_labels(dir: impl AsRef<Path>, lags: &[u32]) -> Result<LaggedLabels> {
    let dir = dir.as_ref();
    let mut loaded = LaggedLabels::default();
    let mut files = 0;

    let mut lags = lags.to_vec();
    lags.sort_unstable();

    for lag in lags {
        let path = lagged_label_file(dir, lag);
        if !path.exists() {
            debug!(lag, path = %path.display(), "no lagged label file");
            continue;
        }
        let df = read_csv(&path)?;
        files += 1;

        let columns = target_columns(&df);
        for &(_, index) in &columns {
            if let Entry::Vacant(slot) = loaded.first_lag.entry(index) {
                slot.insert(lag);
                loaded.columns.push(index);
            }
        }

        let rows = lagged_rows(&df, lag, &columns)?;
        debug!(lag, rows = rows.len(), targets = columns.len(), "loaded lagged labels");
        for (date_id, row) in rows {
            if loaded.store.insert(date_id, row).is_some() {
                warn!(date_id, lag, "duplicate lagged label row; keeping the last one");
            }
        }
    }

    if files == 0 {
        return Err(SoleraError::InvalidData(format!(
            "no lagged label files in {}",
            dir.display()
        )));
    }
    if loaded.columns.is_empty() {
        return Err(SoleraError::InvalidData(format!(
            "could not infer target columns from {}",
            dir.display()
        )));
    }

    info!(
        path = %dir.display(),
        files,
        rows = loaded.store.len(),
        targets = loaded.columns.len(),
        "loaded lagged labels"
    );
    Ok(loaded)
}

fn lagged_rows(
    df: &DataFrame,
    lag: u32,
    columns: &[(String, TargetIndex)],
) -> Result<Vec<(DateId, LaggedLabelRow)>> {
    let dates = date_ids(df)?;
    let label_dates = if has_column(df, LABEL_DATE_ID_COLUMN) {
        i64_values(df, LABEL_DATE_ID_COLUMN)?
    } else {
        vec![None; dates.len()]
    };
    let values = columns
        .iter()
        .map(|(name, _)| f64_values(df, name))
        .collect::<Result<Vec<_>>>()?;

    Ok(dates
        .iter()
        .zip(label_dates)
        .enumerate()
        .map(|(i, (&date_id, label_date_id))| {
            let values: TargetValues = columns
                .iter()
                .zip(&values)
                .map(|((_, index), column)| (*index, column[i]))
                .collect();
            let row = LaggedLabelRow {
                lag,
                label_date_id: label_date_id.unwrap_or(date_id - i64::from(lag) - 1),
                values,
            };
            (date_id, row)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solera_traits::LaggedLabelSource;
    use std::fs;

    #[test]
    fn test_load_label_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_labels.csv");
        fs::write(
            &path,
            "date_id,target_1,target_0,note\n2,0.2,,x\n1,0.1,0.3,y\n",
        )
        .unwrap();

        let table = load_label_table(&path, None).unwrap();
        assert_eq!(table.targets(), &[1, 0]);
        assert_eq!(table.dates(), &[1, 2]);
        assert_relative_eq!(table.get(1, 0).unwrap(), 0.3);
        assert!(table.get(2, 0).unwrap().is_nan());
    }

    #[test]
    fn test_label_table_checks_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_labels.csv");
        fs::write(&path, "date_id,target_0,target_5\n1,0.1,0.2\n").unwrap();

        let registry = TargetRegistry::uniform(2, 1).unwrap();
        assert!(matches!(
            load_label_table(&path, Some(&registry)),
            Err(SoleraError::UnknownTarget(5))
        ));
    }

    #[test]
    fn test_label_table_duplicate_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_labels.csv");
        fs::write(&path, "date_id,target_0\n1,0.1\n1,0.2\n").unwrap();
        assert!(load_label_table(&path, None).is_err());
    }

    #[test]
    fn test_load_lagged_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            lagged_label_file(dir.path(), 1),
            "date_id,label_date_id,target_0,target_1\n10,8,0.1,\n11,9,0.2,0.3\n",
        )
        .unwrap();
        // No label_date_id column: defaults to date_id - lag - 1
        fs::write(
            lagged_label_file(dir.path(), 2),
            "date_id,target_2,target_1\n10,0.5,0.6\n",
        )
        .unwrap();

        let loaded = load_lagged_labels(dir.path(), &[1, 2, 3, 4]).unwrap();
        assert_eq!(loaded.columns, vec![0, 1, 2]);
        assert_eq!(loaded.store.len(), 3);
        assert_eq!(loaded.store.served_dates(), vec![10, 11]);

        let lag1 = loaded.store.lagged_labels(10, 1).unwrap().unwrap();
        assert_eq!(lag1.label_date_id, 8);
        assert_relative_eq!(lag1.values.get(0).unwrap(), 0.1);
        assert!(lag1.values.get(1).unwrap().is_nan());

        let lag2 = loaded.store.lagged_labels(10, 2).unwrap().unwrap();
        assert_eq!(lag2.label_date_id, 7);
        assert_eq!(lag2.values.target_set(), std::collections::BTreeSet::from([1, 2]));
        assert!(loaded.store.lagged_labels(11, 2).unwrap().is_none());

        let registry = loaded.inferred_registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(1).unwrap().lag, 1);
        assert_eq!(registry.get(2).unwrap().lag, 2);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_lagged_labels(dir.path(), &[1, 2]),
            Err(SoleraError::InvalidData(_))
        ));
    }

    #[test]
    fn test_resolve_directory_fallback() {
        let root = tempfile::tempdir().unwrap();
        let data_dir = root.path().join("data");
        fs::create_dir(&data_dir).unwrap();
        assert!(resolve_lagged_label_dir(&data_dir).is_err());

        let beside = root.path().join(LAGGED_LABEL_DIR);
        fs::create_dir(&beside).unwrap();
        assert_eq!(resolve_lagged_label_dir(&data_dir).unwrap(), beside);

        let inside = data_dir.join(LAGGED_LABEL_DIR);
        fs::create_dir(&inside).unwrap();
        assert_eq!(resolve_lagged_label_dir(&data_dir).unwrap(), inside);
    }
}
