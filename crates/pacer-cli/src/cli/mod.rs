//! CLI for trying out pacer retry and rate-limit policies.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use pacer_core::config::{self, PacerConfig};
use pacer_core::FailureKind;

use commands::{
    run_completions, run_config, run_limit, run_man, run_retry, LimitOptions, RetryOptions,
};

/// Top-level CLI for pacer.
#[derive(Debug, Parser)]
#[command(name = "pacer")]
#[command(about = "Pacer: retry with backoff and token-bucket rate limiting", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/pacer/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Simulate an operation that fails N times, run under the retry policy.
    Retry {
        /// Number of failures before the operation succeeds.
        #[arg(long, default_value = "2", value_name = "N")]
        fail_times: u32,
        /// Failure kind reported by each simulated failure.
        #[arg(long, default_value = "timeout")]
        kind: FailureKind,
        /// Override max_attempts from config.
        #[arg(long)]
        attempts: Option<u32>,
        /// Override initial delay (seconds).
        #[arg(long, value_name = "SECS")]
        delay: Option<f64>,
        /// Override backoff multiplier.
        #[arg(long)]
        multiplier: Option<f64>,
        /// Cap each delay (seconds).
        #[arg(long, value_name = "SECS")]
        max_delay: Option<f64>,
        /// Retry only these kinds (comma separated).
        #[arg(long, value_delimiter = ',')]
        retry_on: Vec<FailureKind>,
        /// Record backoff delays instead of sleeping.
        #[arg(long)]
        dry_run: bool,
        /// Print the event trail after the run.
        #[arg(long)]
        events: bool,
    },

    /// Fire N acquire calls at a token bucket and report each decision.
    Limit {
        /// Number of acquire calls.
        #[arg(long, default_value = "10", value_name = "N")]
        requests: u32,
        /// Override bucket capacity.
        #[arg(long)]
        capacity: Option<f64>,
        /// Override refill period (seconds).
        #[arg(long, value_name = "SECS")]
        period: Option<f64>,
        /// Pause between calls (milliseconds).
        #[arg(long, default_value = "0", value_name = "MS")]
        interval_ms: u64,
        /// Print the event trail after the run.
        #[arg(long)]
        events: bool,
    },

    /// Show the config file path and effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        shell: Shell,
    },

    /// Render the man page (roff) to stdout.
    Man,
}

fn load_config(path: Option<&PathBuf>) -> Result<(PathBuf, PacerConfig)> {
    let (path, cfg) = match path {
        Some(p) => (p.clone(), config::load_from_path(p)?),
        None => (config::config_path()?, config::load_or_init()?),
    };
    tracing::debug!("loaded config from {}: {:?}", path.display(), cfg);
    Ok((path, cfg))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_path = cli.config.as_ref();

        match cli.command {
            CliCommand::Retry {
                fail_times,
                kind,
                attempts,
                delay,
                multiplier,
                max_delay,
                retry_on,
                dry_run,
                events,
            } => {
                let (_, cfg) = load_config(config_path)?;
                let opts = RetryOptions {
                    fail_times,
                    kind,
                    attempts,
                    delay,
                    multiplier,
                    max_delay,
                    retry_on,
                    dry_run,
                    events,
                };
                run_retry(&cfg.retry, &opts).await?;
            }
            CliCommand::Limit {
                requests,
                capacity,
                period,
                interval_ms,
                events,
            } => {
                let (_, cfg) = load_config(config_path)?;
                let opts = LimitOptions {
                    requests,
                    capacity,
                    period,
                    interval_ms,
                    events,
                };
                run_limit(&cfg.rate_limit, &opts).await?;
            }
            CliCommand::Config => {
                let (path, cfg) = load_config(config_path)?;
                run_config(&path, &cfg)?;
            }
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
