//! Simulation configuration.

use serde::{Deserialize, Serialize};
use solera_eval::MetricsConfig;
use solera_traits::{Result, SoleraError};
use std::path::Path;
use std::time::Duration;

/// Lags served by the production data feed.
pub const DEFAULT_LAGS: [u32; 4] = [1, 2, 3, 4];

/// How the set of targets a prediction must cover is chosen each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Every registry target, every day.
    Registry,
    /// Targets present in the day's served lagged rows; the full registry on
    /// days that serve nothing.
    #[default]
    ServedLabels,
}

/// Configuration for a sequential evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock limit for the whole run, in seconds
    pub time_budget_secs: Option<f64>,
    /// Lags requested from the label source on every step
    pub lags: Vec<u32>,
    /// Expected target set policy
    pub schema: SchemaPolicy,
    /// Scoring settings for offline runs
    pub metrics: MetricsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: None,
            lags: DEFAULT_LAGS.to_vec(),
            schema: SchemaPolicy::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Sets the wall-clock limit.
    pub fn with_time_budget(mut self, limit: Duration) -> Self {
        self.time_budget_secs = Some(limit.as_secs_f64());
        self
    }

    /// Sets the expected target set policy.
    pub const fn with_schema(mut self, schema: SchemaPolicy) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the lags requested on every step.
    pub fn with_lags(mut self, lags: Vec<u32>) -> Self {
        self.lags = lags;
        self
    }

    /// The wall-clock limit, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SoleraError::Config`] when the seconds are negative, not
    /// finite, or too large for a [`Duration`].
    pub fn time_budget(&self) -> Result<Option<Duration>> {
        self.time_budget_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    SoleraError::Config(format!("time budget out of range: {secs} seconds"))
                })
            })
            .transpose()
    }

    /// Checks the configuration for values the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.time_budget()?;
        if self.lags.is_empty() {
            return Err(SoleraError::Config("at least one lag is required".to_string()));
        }
        if self.lags.contains(&0) {
            return Err(SoleraError::Config("lags must be positive".to_string()));
        }
        let mut sorted = self.lags.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.lags.len() {
            return Err(SoleraError::Config(format!(
                "duplicate lags in {:?}",
                self.lags
            )));
        }
        if self.metrics.trading_days_per_year == 0 {
            return Err(SoleraError::Config(
                "trading_days_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses a TOML document. Missing keys take their default.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SoleraError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Saves configuration to a TOML file.
    pub fn to_toml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SoleraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
