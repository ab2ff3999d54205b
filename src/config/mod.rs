use anyhow::{bail, Context};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::expiry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub registry: RegistryConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    #[default]
    Full,
}

#[derive(Debug, Error)]
#[error("unknown log format '{0}', supported values: compact, full")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            _ => Err(UnknownLogFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Prefix joined with a short code to build the public short URL
    pub base_url: String,
    /// Length of randomly generated short codes
    pub short_code_length: usize,
    pub default_validity_minutes: i64,
    pub min_validity_minutes: i64,
    pub max_validity_minutes: i64,
    pub custom_code_min_length: usize,
    pub custom_code_max_length: usize,
    /// Generator draws tried before giving up on a random code
    pub max_allocation_attempts: u32,
    pub sweep_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            short_code_length: 6,
            default_validity_minutes: 30,
            min_validity_minutes: 1,
            max_validity_minutes: 525_600,
            custom_code_min_length: 3,
            custom_code_max_length: 20,
            max_allocation_attempts: 16,
            sweep_interval_secs: 60,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.short_code_length == 0 {
            bail!("SHORT_CODE_LENGTH must be at least 1");
        }
        if self.min_validity_minutes < 1 {
            bail!("MIN_VALIDITY_MINUTES must be at least 1");
        }
        if self.min_validity_minutes > self.max_validity_minutes {
            bail!(
                "MIN_VALIDITY_MINUTES ({}) exceeds MAX_VALIDITY_MINUTES ({})",
                self.min_validity_minutes,
                self.max_validity_minutes
            );
        }
        if !(self.min_validity_minutes..=self.max_validity_minutes)
            .contains(&self.default_validity_minutes)
        {
            bail!(
                "DEFAULT_VALIDITY_MINUTES ({}) must be within [{}, {}]",
                self.default_validity_minutes,
                self.min_validity_minutes,
                self.max_validity_minutes
            );
        }
        if self.custom_code_min_length == 0
            || self.custom_code_min_length > self.custom_code_max_length
        {
            bail!(
                "custom code length bounds [{}, {}] are invalid",
                self.custom_code_min_length,
                self.custom_code_max_length
            );
        }
        if expiry::expires_at(Utc::now(), self.max_validity_minutes).is_none() {
            bail!(
                "MAX_VALIDITY_MINUTES ({}) is too large to compute an expiry time",
                self.max_validity_minutes
            );
        }
        if self.max_allocation_attempts == 0 {
            bail!("MAX_ALLOCATION_ATTEMPTS must be at least 1");
        }
        if self.sweep_interval_secs == 0 {
            bail!("EXPIRY_SWEEP_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = RegistryConfig::default();

        let base_url = std::env::var("BASE_URL").unwrap_or(defaults.base_url);

        let registry = RegistryConfig {
            base_url,
            short_code_length: env_or("SHORT_CODE_LENGTH", defaults.short_code_length)?,
            default_validity_minutes: env_or(
                "DEFAULT_VALIDITY_MINUTES",
                defaults.default_validity_minutes,
            )?,
            min_validity_minutes: env_or("MIN_VALIDITY_MINUTES", defaults.min_validity_minutes)?,
            max_validity_minutes: env_or("MAX_VALIDITY_MINUTES", defaults.max_validity_minutes)?,
            custom_code_min_length: env_or(
                "CUSTOM_CODE_MIN_LENGTH",
                defaults.custom_code_min_length,
            )?,
            custom_code_max_length: env_or(
                "CUSTOM_CODE_MAX_LENGTH",
                defaults.custom_code_max_length,
            )?,
            max_allocation_attempts: env_or(
                "MAX_ALLOCATION_ATTEMPTS",
                defaults.max_allocation_attempts,
            )?,
            sweep_interval_secs: env_or("EXPIRY_SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
        };
        registry.validate()?;

        let log_format = env_or("LOG_FORMAT", LogFormat::default())?;

        Ok(Config {
            registry,
            log_format,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
