//! Configuration loading from environment.

use std::env;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub provider_url: String,
    pub provider_timeout: Duration,
    pub refresh_interval: Duration,
    pub refresh_deadline: Duration,
    pub confirm_interval: Duration,
    pub storage_timeout: Duration,
    pub log_format: LogFormat,
    /// OTLP export is enabled only when this is set.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT: {}", e))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let provider_url =
            lookup("PROVIDER_URL").unwrap_or_else(|| "https://api.frankfurter.app".to_string());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!("LOG_FORMAT must be text or json, got {:?}", other),
        };

        Ok(Self {
            port,
            database_url,
            provider_url,
            provider_timeout: seconds(&lookup, "PROVIDER_TIMEOUT_SECS", 5)?,
            refresh_interval: seconds(&lookup, "REFRESH_INTERVAL_SECS", 60)?,
            refresh_deadline: seconds(&lookup, "REFRESH_DEADLINE_SECS", 10)?,
            confirm_interval: seconds(&lookup, "CONFIRM_INTERVAL_SECS", 5)?,
            storage_timeout: seconds(&lookup, "STORAGE_TIMEOUT_SECS", 10)?,
            log_format,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|s| !s.is_empty()),
        })
    }
}

/// Positive whole seconds.
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    let secs = match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("{}: {}", key, e))?,
        None => default,
    };
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}
