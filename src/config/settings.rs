//! # Configuration Settings
//!
//! Runtime settings for the gateway itself. Provider credentials are not part
//! of these settings; they arrive per call as [`crate::domain::ProviderConfig`].

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Environment variable prefix for gateway settings
pub const ENV_PREFIX: &str = "CACHEGATE";

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct GatewaySettings {
    /// Outbound HTTP configuration
    #[validate(nested)]
    pub http: HttpSettings,

    /// Per-chunk retry policy applied by the orchestrator
    #[validate(nested)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl GatewaySettings {
    /// Load settings from an optional file layered under `CACHEGATE__*`
    /// environment variables (e.g. `CACHEGATE__HTTP__TIMEOUT_SECONDS=10`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let environment =
            config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true);
        let settings: GatewaySettings = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;
        Ok(())
    }
}

/// Outbound HTTP configuration shared by every provider client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HttpSettings {
    /// Total per-request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// User-Agent sent to vendors
    #[validate(length(min = 1, message = "User agent cannot be empty"))]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            user_agent: format!("{}/{}", crate::APP_NAME, crate::VERSION),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Retry policy with exponential backoff for retryable chunk failures
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries per chunk (0 = fail fast)
    #[validate(range(max = 10, message = "Max retries must be at most 10"))]
    pub max_retries: u32,

    /// Initial backoff in milliseconds
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    pub max_backoff_ms: u64,

    /// Backoff multiplier for exponential backoff
    #[validate(range(min = 1.0, max = 10.0, message = "Multiplier must be between 1 and 10"))]
    pub backoff_multiplier: f64,

    /// Honour a vendor `Retry-After` hint when it is longer than the backoff.
    /// The hint is still capped at `max_backoff_ms`.
    pub respect_retry_after: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
            respect_retry_after: true,
        }
    }
}

impl RetryConfig {
    /// Policy that never retries
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Backoff to wait before retry number `attempt` (1-based), never more
    /// than `max_backoff_ms`.
    pub fn backoff_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let ceiling = Duration::from_millis(self.max_backoff_ms);
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = (self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent))
            .min(self.max_backoff_ms as f64) as u64;
        let backoff = Duration::from_millis(millis);

        match retry_after {
            Some(seconds) if self.respect_retry_after => {
                backoff.max(Duration::from_secs(seconds)).min(ceiling)
            }
            _ => backoff,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Record purge/vendor metrics through the `metrics` facade
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings_validate() {
        let settings = GatewaySettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.http.timeout(), Duration::from_secs(30));
        assert_eq!(settings.retry.max_retries, 0);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut settings = GatewaySettings::default();
        settings.http.timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
            backoff_multiplier: 2.0,
            respect_retry_after: false,
        };
        assert_eq!(retry.backoff_for(1, None), Duration::from_millis(100));
        assert_eq!(retry.backoff_for(2, None), Duration::from_millis(200));
        assert_eq!(retry.backoff_for(3, None), Duration::from_millis(350));
        assert_eq!(retry.backoff_for(3, Some(60)), Duration::from_millis(350));
    }

    #[test]
    fn test_backoff_respects_retry_after() {
        let retry = RetryConfig { initial_backoff_ms: 100, ..Default::default() };
        assert_eq!(retry.backoff_for(1, Some(2)), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_after_capped_at_max_backoff() {
        let retry = RetryConfig { max_retries: 1, max_backoff_ms: 10_000, ..Default::default() };
        assert_eq!(retry.backoff_for(1, Some(86_400)), Duration::from_secs(10));
        assert_eq!(retry.backoff_for(1, Some(u64::MAX)), Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[http]\ntimeout_seconds = 12\n\n[retry]\nmax_retries = 2\n\n\
             [observability]\nlog_level = \"debug\""
        )
        .unwrap();

        let settings = GatewaySettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.http.timeout_seconds, 12);
        assert_eq!(settings.http.connect_timeout_seconds, 10);
        assert_eq!(settings.retry.max_retries, 2);
        assert_eq!(settings.observability.log_level, "debug");
    }
}
