//! Dayloop command implementation.
//!
//! Replays the served test feed day by day with the carry-forward baseline
//! and writes a submission.

use crate::cmd::{print_header, print_section};
use crate::predictor::CarryForward;
use anyhow::{Context, Result};
use solera_data::{
    FeatureTable, load_lagged_labels, load_registry, resolve_lagged_label_dir, write_submission,
};
use solera_sim::{SequentialEvaluationLoop, SimulationConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Name of the served feature file inside the data directory.
const TEST_FILE: &str = "test.csv";

/// Run the day loop over `data_dir` and write the submission to `out`.
pub(crate) fn run_dayloop(
    data_dir: &Path,
    registry_path: Option<&Path>,
    out: &Path,
    seed: u64,
    config: SimulationConfig,
) -> Result<()> {
    print_header("Day Loop");

    let test_path = data_dir.join(TEST_FILE);
    let features = FeatureTable::load(&test_path)
        .with_context(|| format!("loading {}", test_path.display()))?
        .with_lookback(1);
    let dates = features.calendar()?;

    let label_dir = resolve_lagged_label_dir(data_dir)?;
    let lagged = load_lagged_labels(&label_dir, &config.lags)?;
    let registry = match registry_path {
        Some(path) => load_registry(path)?,
        None => lagged
            .inferred_registry()
            .context("could not infer a target registry from the lagged label columns")?,
    };

    println!("Data:      {}", data_dir.display());
    println!("Labels:    {}", label_dir.display());
    println!("Dates:     {}", dates.len());
    println!("Targets:   {}", registry.len());
    println!("Seed:      {seed}");
    if let Some(budget) = config.time_budget()? {
        println!("Budget:    {:.1}s", budget.as_secs_f64());
    }
    println!();

    let mut sim = SequentialEvaluationLoop::new(
        dates,
        Arc::new(registry),
        lagged.store,
        features,
        CarryForward::new(seed),
        config,
    )?;
    let output = sim.run()?;

    let format = write_submission(&output, out)?;
    info!(path = %out.display(), ?format, "submission written");

    print_section("SUBMISSION");
    println!(
        "Wrote {} with shape ({}, {})",
        out.display(),
        output.len(),
        output.targets().len() + 1
    );
    if !output.warnings().is_empty() {
        println!(
            "{} day(s) contained non-finite predictions",
            output.warnings().len()
        );
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solera_data::{lagged_label_file, read_submission};
    use std::fs;

    fn data_dir(root: &Path) -> std::path::PathBuf {
        let data = root.join("data");
        let labels = data.join(solera_data::LAGGED_LABEL_DIR);
        fs::create_dir_all(&labels).unwrap();
        fs::write(data.join(TEST_FILE), "date_id,x\n10,0.1\n11,0.2\n12,0.3\n").unwrap();
        fs::write(
            lagged_label_file(&labels, 1),
            "date_id,label_date_id,target_0,target_1\n10,8,0.1,0.2\n11,9,0.3,\n12,10,0.5,0.6\n",
        )
        .unwrap();
        fs::write(
            lagged_label_file(&labels, 2),
            "date_id,label_date_id,target_2\n10,7,0.9\n11,8,0.8\n12,9,0.7\n",
        )
        .unwrap();
        data
    }

    #[test]
    fn test_dayloop_writes_submission() {
        let root = tempfile::tempdir().unwrap();
        let data = data_dir(root.path());
        let out = root.path().join("submission.csv");

        run_dayloop(&data, None, &out, 0, SimulationConfig::default()).unwrap();

        let submission = read_submission(&out).unwrap();
        assert_eq!(submission.dates(), &[10, 11, 12]);
        assert_eq!(submission.targets(), &[0, 1, 2]);
        // Carried forward plus micro jitter
        assert!((submission.get(12, 2).unwrap() - 0.7).abs() < 1e-4);
        // Null label falls back to the previous release
        assert!((submission.get(11, 1).unwrap() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_dayloop_requires_test_file() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("submission.parquet");
        assert!(run_dayloop(root.path(), None, &out, 0, SimulationConfig::default()).is_err());
        assert!(!out.exists());
    }
}
