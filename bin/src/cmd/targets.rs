//! Targets command implementation.

use crate::cmd::{OutputFormat, print_header};
use anyhow::Result;
use solera_data::load_registry;
use solera_traits::Target;
use std::path::Path;

/// List the targets of a registry file.
pub(crate) fn list_targets(
    registry_path: &Path,
    lag: Option<u32>,
    verbose: bool,
    format: OutputFormat,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let targets: Vec<&Target> = registry
        .iter()
        .filter(|t| lag.is_none_or(|l| t.lag == l))
        .collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    print_header("Targets");
    println!("Registry: {}", registry_path.display());
    println!("Targets:  {}", registry.len());
    println!();

    println!("{:<6} {:>8} {:>8} {:>8}", "Lag", "Targets", "Pairs", "Single");
    println!("{}", "-".repeat(34));
    for l in registry.lags() {
        if lag.is_some_and(|wanted| wanted != l) {
            continue;
        }
        let with_lag: Vec<&Target> = registry.with_lag(l).collect();
        let pairs = with_lag.iter().filter(|t| t.instruments.is_pair()).count();
        println!(
            "{:<6} {:>8} {:>8} {:>8}",
            l,
            with_lag.len(),
            pairs,
            with_lag.len() - pairs
        );
    }
    println!();

    if verbose {
        for target in &targets {
            println!(
                "  {:12} lag {}  {}",
                target.column_name(),
                target.lag,
                target.instruments
            );
        }
        println!();
    } else {
        println!("Use --verbose to list every target.\n");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_pairs.csv");
        std::fs::write(&path, "target,lag,pair\ntarget_0,1,A\ntarget_1,2,A - B\n").unwrap();

        assert!(list_targets(&path, None, true, OutputFormat::Text).is_ok());
        assert!(list_targets(&path, Some(2), false, OutputFormat::Json).is_ok());
    }

    #[test]
    fn test_missing_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(list_targets(&path, None, false, OutputFormat::Text).is_err());
    }
}
