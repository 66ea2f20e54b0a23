//! Solera CLI binary.
//!
//! Provides command-line access to IC-Sharpe scoring and the sequential
//! day-by-day evaluation loop.

mod cmd;
mod predictor;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::backtest::DateRange;
use cmd::{OutputFormat, Overrides, SchemaArg};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "solera")]
#[command(about = "IC-Sharpe scoring and leakage-safe day-by-day evaluation", long_about = None)]
#[command(version)]
struct Cli {
    /// Simulation config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score prediction files against a label table
    Score {
        /// Wide label CSV (date_id + target_N columns)
        #[arg(short, long)]
        truth: PathBuf,

        /// Prediction files (Parquet or CSV)
        #[arg(required = true)]
        predictions: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Print the per-day IC series
        #[arg(long)]
        daily: bool,
    },

    /// Run the carry-forward baseline over the served test feed
    Dayloop {
        /// Directory containing test.csv and lagged_test_labels
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Target registry CSV (inferred from the label columns if omitted)
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Submission path (.parquet or .csv)
        #[arg(short, long, default_value = "submission.parquet")]
        out: PathBuf,

        /// Jitter seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Wall-clock budget in seconds
        #[arg(long)]
        time_budget: Option<f64>,

        /// Expected target set policy
        #[arg(long, value_enum)]
        schema: Option<SchemaArg>,
    },

    /// Replay historical labels day by day and score the baseline
    Backtest {
        /// Target registry CSV
        #[arg(short, long)]
        registry: PathBuf,

        /// Wide label CSV
        #[arg(short, long)]
        labels: PathBuf,

        /// First served date_id
        #[arg(long)]
        start: Option<i64>,

        /// Last served date_id
        #[arg(long)]
        end: Option<i64>,

        /// Jitter seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Wall-clock budget in seconds
        #[arg(long)]
        time_budget: Option<f64>,

        /// Expected target set policy
        #[arg(long, value_enum)]
        schema: Option<SchemaArg>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Print the per-day IC series
        #[arg(long)]
        daily: bool,
    },

    /// Show the target registry
    Targets {
        /// Target registry CSV
        #[arg(short, long)]
        registry: PathBuf,

        /// Only targets with this lag
        #[arg(long)]
        lag: Option<u32>,

        /// List every target
        #[arg(short, long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so JSON reports stay parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("solera=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Score {
            truth,
            predictions,
            format,
            daily,
        } => {
            let config = cmd::load_config(config_path, Overrides::default())?;
            cmd::score::score_predictions(&truth, &predictions, &config.metrics, format, daily)
                .await?;
        }
        Commands::Dayloop {
            data_dir,
            registry,
            out,
            seed,
            time_budget,
            schema,
        } => {
            let config = cmd::load_config(
                config_path,
                Overrides {
                    time_budget_secs: time_budget,
                    schema,
                },
            )?;
            cmd::dayloop::run_dayloop(&data_dir, registry.as_deref(), &out, seed, config)?;
        }
        Commands::Backtest {
            registry,
            labels,
            start,
            end,
            seed,
            time_budget,
            schema,
            format,
            daily,
        } => {
            let config = cmd::load_config(
                config_path,
                Overrides {
                    time_budget_secs: time_budget,
                    schema,
                },
            )?;
            cmd::backtest::run_backtest(
                &registry,
                &labels,
                DateRange { start, end },
                seed,
                config,
                format,
                daily,
            )?;
        }
        Commands::Targets {
            registry,
            lag,
            verbose,
            format,
        } => {
            cmd::targets::list_targets(&registry, lag, verbose, format)?;
        }
    }

    Ok(())
}
