//! CLI subcommand modules.
//!
//! This module contains the implementations for all solera CLI subcommands.

pub(crate) mod backtest;
pub(crate) mod dayloop;
pub(crate) mod score;
pub(crate) mod targets;

use anyhow::{Context, Result};
use clap::ValueEnum;
use solera_sim::{SchemaPolicy, SimulationConfig};
use std::path::Path;
use std::time::Duration;

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Expected target set policy, as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SchemaArg {
    /// Every registry target, every day
    Registry,
    /// Targets served in the day's lagged labels
    ServedLabels,
}

impl From<SchemaArg> for SchemaPolicy {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Registry => Self::Registry,
            SchemaArg::ServedLabels => Self::ServedLabels,
        }
    }
}

/// Flags that override the configuration file.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Overrides {
    pub(crate) time_budget_secs: Option<f64>,
    pub(crate) schema: Option<SchemaArg>,
}

/// Loads the configuration file if given, then applies flag overrides.
pub(crate) fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<SimulationConfig> {
    let mut config = path
        .map(|path| {
            SimulationConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))
        })
        .transpose()?
        .unwrap_or_default();
    if let Some(secs) = overrides.time_budget_secs {
        config = config.with_time_budget(
            Duration::try_from_secs_f64(secs).context("invalid --time-budget")?,
        );
    }
    if let Some(schema) = overrides.schema {
        config = config.with_schema(schema.into());
    }
    config.validate()?;
    Ok(config)
}

/// Prints a boxed section header.
pub(crate) fn print_header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{title:^62}║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

/// Prints a ruled subsection title.
pub(crate) fn print_section(title: &str) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{title}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, "time_budget_secs = 10.0\nlags = [1, 2]\n").unwrap();

        let config = load_config(
            Some(&path),
            Overrides {
                time_budget_secs: Some(3.0),
                schema: Some(SchemaArg::Registry),
            },
        )
        .unwrap();
        assert_eq!(config.time_budget().unwrap(), Some(Duration::from_secs(3)));
        assert_eq!(config.schema, SchemaPolicy::Registry);
        assert_eq!(config.lags, vec![1, 2]);
    }

    #[test]
    fn test_negative_budget_rejected() {
        let result = load_config(
            None,
            Overrides {
                time_budget_secs: Some(-1.0),
                schema: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(Some(Path::new("/nonexistent/sim.toml")), Overrides::default()).is_err());
    }
}
