use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{secs_to_duration, ConfigError};
use crate::rate_limit::{RateLimiter, RateLimiterBuilder};
use crate::retry::{FailureKind, RetryOn, RetryPolicy, RetryPolicyBuilder};

/// Retry policy parameters (`[retry]` in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds (e.g. 0.25 = 250ms).
    pub initial_delay_secs: f64,
    /// Factor applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
    /// Optional ceiling on a single delay, in seconds. Uncapped when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_secs: Option<f64>,
    /// Failure kinds to retry; every kind when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on: Option<Vec<FailureKind>>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_secs: 1.0,
            backoff_multiplier: 2.0,
            max_delay_secs: None,
            retry_on: None,
        }
    }
}

impl RetryConfig {
    /// Builder pre-filled from this section; callers add sink/sleeper/hook.
    pub fn to_builder(&self) -> Result<RetryPolicyBuilder, ConfigError> {
        let max_delay = self
            .max_delay_secs
            .map(|secs| secs_to_duration("max_delay_secs", secs))
            .transpose()?;
        let retry_on = match &self.retry_on {
            Some(kinds) => RetryOn::kinds(kinds.iter().copied()),
            None => RetryOn::All,
        };
        Ok(RetryPolicy::builder()
            .max_attempts(self.max_attempts)
            .initial_delay(secs_to_duration("initial_delay_secs", self.initial_delay_secs)?)
            .backoff_multiplier(self.backoff_multiplier)
            .max_delay(max_delay)
            .retry_on(retry_on))
    }

    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.to_builder()?.build()
    }
}

/// Token bucket parameters (`[rate_limit]` in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum tokens in the bucket.
    pub capacity: f64,
    /// Seconds for an empty bucket to refill completely.
    pub refill_period_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_period_secs: 1.0,
        }
    }
}

impl RateLimitConfig {
    pub fn to_builder(&self) -> Result<RateLimiterBuilder, ConfigError> {
        let period = secs_to_duration("refill_period_secs", self.refill_period_secs)?;
        Ok(RateLimiter::builder()
            .capacity(self.capacity)
            .refill_period(period))
    }

    pub fn to_limiter(&self) -> Result<Arc<RateLimiter>, ConfigError> {
        Ok(Arc::new(self.to_builder()?.build()?))
    }
}

/// Global configuration loaded from `~/.config/pacer/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacerConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl PacerConfig {
    /// Check both sections without keeping the built primitives.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.to_policy()?;
        self.rate_limit.to_builder()?.build()?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pacer")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PacerConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PacerConfig::default();
        write_to_path(&default_cfg, &path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Read and validate a config file.
pub fn load_from_path(path: &Path) -> Result<PacerConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: PacerConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Render a config as the TOML written to disk.
pub fn to_toml_string(cfg: &PacerConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

pub fn write_to_path(cfg: &PacerConfig, path: &Path) -> Result<()> {
    let toml = to_toml_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}
