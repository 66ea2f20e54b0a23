//! Score command implementation.

use crate::cmd::{OutputFormat, print_header, print_section};
use anyhow::{Result, bail};
use serde_json::json;
use solera_data::{load_label_table, read_submission};
use solera_eval::{Evaluation, MetricsConfig, align, evaluate};
use solera_traits::DateTable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Scores one prediction file against the truth table.
pub(crate) fn score_file(
    truth: &DateTable,
    path: &Path,
    config: &MetricsConfig,
) -> solera_traits::Result<Evaluation> {
    let predictions = read_submission(path)?;
    let (truth, predictions) = align(truth, &predictions)?;
    evaluate(&truth, &predictions, config)
}

/// Score every prediction file against `truth_path`, concurrently.
pub(crate) async fn score_predictions(
    truth_path: &Path,
    predictions: &[PathBuf],
    config: &MetricsConfig,
    format: OutputFormat,
    daily: bool,
) -> Result<()> {
    let truth = Arc::new(load_label_table(truth_path, None)?);

    let mut tasks = JoinSet::new();
    for (position, path) in predictions.iter().cloned().enumerate() {
        let truth = Arc::clone(&truth);
        let config = config.clone();
        tasks.spawn_blocking(move || {
            let result = score_file(&truth, &path, &config);
            (position, path, result)
        });
    }

    let mut results = Vec::with_capacity(predictions.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(position, _, _)| *position);

    let failures = results.iter().filter(|(_, _, r)| r.is_err()).count();

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = results
                .iter()
                .map(|(_, path, result)| match result {
                    Ok(evaluation) => json!({
                        "path": path.display().to_string(),
                        "evaluation": evaluation,
                    }),
                    Err(e) => json!({
                        "path": path.display().to_string(),
                        "error": e.to_string(),
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            print_header("IC-Sharpe Scores");
            println!("Truth:  {}", truth_path.display());
            println!(
                "Labels: {} dates x {} targets",
                truth.len(),
                truth.targets().len()
            );
            println!();

            for (_, path, result) in &results {
                print_section(&path.display().to_string());
                match result {
                    Ok(evaluation) => print_evaluation(evaluation, daily),
                    Err(e) => println!("Error: {e}\n"),
                }
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} prediction file(s) could not be scored", results.len());
    }
    Ok(())
}

/// Prints an evaluation summary, optionally with the per-day series.
pub(crate) fn print_evaluation(evaluation: &Evaluation, daily: bool) {
    let summary = &evaluation.summary;
    println!("{:<22} {:>12}", "Days scored", summary.days);
    println!("{:<22} {:>12}", "Days excluded", evaluation.daily.excluded.len());
    println!("{:<22} {:>12.4}", "Mean IC", summary.mean_ic);
    println!("{:<22} {:>12.4}", "Std IC", summary.std_ic);
    println!("{:<22} {:>12.4}", "IC-Sharpe", summary.sharpe);
    println!("{:<22} {:>12.4}", "Annualized IC-Sharpe", evaluation.annualized_sharpe);
    println!("{:<22} {:>11.1}%", "Hit rate", evaluation.hit_rate * 100.0);
    println!();

    if daily {
        println!("{:<10} {:>10} {:>8}", "date_id", "IC", "pairs");
        println!("{}", "─".repeat(30));
        for score in &evaluation.daily.scores {
            println!("{:<10} {:>10.4} {:>8}", score.date_id, score.ic, score.pairs);
        }
        for excluded in &evaluation.daily.excluded {
            println!(
                "{:<10} {:>10} {:>8}  ({:?})",
                excluded.date_id, "-", excluded.pairs, excluded.reason
            );
        }
        println!();
    }
}
