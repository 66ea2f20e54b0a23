//! Target registry loader.
//!
//! The registry file has one row per target with the columns `target`
//! (canonical name such as `target_17`), `lag` and `pair` (`"A"` or
//! `"A - B"`).

use crate::frame::{i64_values, read_csv, string_values};
use solera_traits::types::parse_target_column;
use solera_traits::{Instruments, Result, SoleraError, Target, TargetRegistry};
use std::path::Path;
use tracing::info;

/// Loads and validates a target registry from CSV.
pub fn load_registry(path: impl AsRef<Path>) -> Result<TargetRegistry> {
    let path = path.as_ref();
    let df = read_csv(path)?;

    let names = string_values(&df, "target")?;
    let lags = i64_values(&df, "lag")?;
    let pairs = string_values(&df, "pair")?;

    let targets = names
        .into_iter()
        .zip(lags)
        .zip(pairs)
        .enumerate()
        .map(|(row, ((name, lag), pair))| {
            let name = name
                .ok_or_else(|| SoleraError::InvalidData(format!("row {row} has no target name")))?;
            let index = parse_target_column(&name).ok_or_else(|| {
                SoleraError::InvalidData(format!("row {row}: '{name}' is not a target column"))
            })?;
            let lag = lag
                .and_then(|l| u32::try_from(l).ok())
                .ok_or_else(|| SoleraError::InvalidData(format!("{name}: invalid lag")))?;
            let pair =
                pair.ok_or_else(|| SoleraError::InvalidData(format!("{name}: missing pair")))?;

            Ok(Target {
                index,
                lag,
                instruments: Instruments::parse(&pair)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let registry = TargetRegistry::new(targets)?;
    info!(
        path = %path.display(),
        targets = registry.len(),
        lags = ?registry.lags(),
        "loaded target registry"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_pairs.csv");
        fs::write(
            &path,
            "target,lag,pair\ntarget_1,2,US_A - FX_B\ntarget_0,1,US_A\n",
        )
        .unwrap();

        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.len(), 2);
        let first = registry.get(0).unwrap();
        assert_eq!(first.lag, 1);
        assert_eq!(first.instruments, Instruments::Single("US_A".to_string()));
        assert!(registry.get(1).unwrap().instruments.is_pair());
        assert_eq!(registry.lags(), vec![1, 2]);
    }

    #[test]
    fn test_rejects_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_pairs.csv");
        fs::write(&path, "target,lag,pair\ntarget_0,1,A\ntarget_2,1,B\n").unwrap();
        assert!(matches!(
            load_registry(&path),
            Err(SoleraError::InvalidData(_))
        ));
    }

    #[test]
    fn test_rejects_bad_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_pairs.csv");
        fs::write(&path, "target,lag,pair\nreturn_0,1,A\n").unwrap();
        assert!(load_registry(&path).is_err());
    }

    #[test]
    fn test_missing_lag_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_pairs.csv");
        fs::write(&path, "target,pair\ntarget_0,A\n").unwrap();
        assert!(matches!(
            load_registry(&path),
            Err(SoleraError::MissingColumn(_))
        ));
    }
}
