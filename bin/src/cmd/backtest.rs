//! Backtest command implementation.

use crate::cmd::score::print_evaluation;
use crate::cmd::{OutputFormat, print_header, print_section};
use crate::predictor::CarryForward;
use anyhow::{Result, bail};
use solera_data::{LabelReplay, load_label_table, load_registry};
use solera_sim::{OfflineReport, SequentialEvaluationLoop, SimulationConfig};
use solera_traits::{DateId, NoFeatures};
use std::path::Path;
use std::sync::Arc;

/// Served date range of a backtest.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DateRange {
    pub(crate) start: Option<DateId>,
    pub(crate) end: Option<DateId>,
}

impl DateRange {
    fn contains(&self, date_id: DateId) -> bool {
        self.start.is_none_or(|start| date_id >= start) && self.end.is_none_or(|end| date_id <= end)
    }
}

/// Replays historical labels through the day loop and scores the result.
pub(crate) fn backtest(
    registry_path: &Path,
    labels_path: &Path,
    range: DateRange,
    seed: u64,
    config: SimulationConfig,
) -> Result<OfflineReport> {
    let registry = Arc::new(load_registry(registry_path)?);
    let truth = load_label_table(labels_path, Some(&registry))?;

    let dates: Vec<DateId> = truth
        .dates()
        .iter()
        .copied()
        .filter(|&d| range.contains(d))
        .collect();
    if dates.is_empty() {
        bail!("no label dates fall inside the requested range");
    }

    let replay = LabelReplay::new(truth.clone(), &registry)?;
    let mut sim = SequentialEvaluationLoop::new(
        dates,
        registry,
        replay,
        NoFeatures,
        CarryForward::new(seed),
        config,
    )?;
    Ok(sim.run_offline(&truth)?)
}

/// Run the carry-forward backtest and print the report.
pub(crate) fn run_backtest(
    registry_path: &Path,
    labels_path: &Path,
    range: DateRange,
    seed: u64,
    config: SimulationConfig,
    format: OutputFormat,
    daily: bool,
) -> Result<()> {
    let report = backtest(registry_path, labels_path, range, seed, config)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_header("Backtest");
    println!("Predictor: {}", report.predictor);
    println!("Registry:  {}", registry_path.display());
    println!("Labels:    {}", labels_path.display());
    println!("Days:      {}", report.days);
    println!("Warnings:  {}", report.quality_warnings);
    println!(
        "Runtime:   {:.2}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!();

    print_section("RESULTS");
    print_evaluation(&report.evaluation, daily);

    Ok(())
}
