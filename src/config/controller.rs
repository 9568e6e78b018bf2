//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::config::duration::parse_kubernetes_duration;
use crate::constants::{
    DEFAULT_GENERATOR_GC_GRACE_PERIOD_SECS, DEFAULT_METRICS_PORT, ENV_GENERATOR_GC_GRACE_PERIOD,
};
use anyhow::{Context, Result};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a generated artifact sits in `GC` before a cleanup attempt fires
    pub generator_gc_grace_period: Duration,
    /// Port for the metrics and probe server
    pub metrics_port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            generator_gc_grace_period: Duration::from_secs(DEFAULT_GENERATOR_GC_GRACE_PERIOD_SECS),
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// A malformed grace period is an error, not a fallback to the default.
    pub fn from_env() -> Result<Self> {
        let generator_gc_grace_period = match std::env::var(ENV_GENERATOR_GC_GRACE_PERIOD) {
            Ok(raw) => parse_kubernetes_duration(&raw)
                .with_context(|| format!("Invalid {ENV_GENERATOR_GC_GRACE_PERIOD} '{raw}'"))?,
            Err(_) => Duration::from_secs(DEFAULT_GENERATOR_GC_GRACE_PERIOD_SECS),
        };

        Ok(Self {
            generator_gc_grace_period,
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "json"),
        })
    }

    /// Override the grace period from a Kubernetes duration string (CLI flag)
    pub fn with_grace_period(mut self, raw: &str) -> Result<Self> {
        self.generator_gc_grace_period = parse_kubernetes_duration(raw)
            .with_context(|| format!("Invalid --generator-gc-grace-period '{raw}'"))?;
        Ok(self)
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
