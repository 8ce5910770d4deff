//! # Structured Logging
//!
//! Subscriber installation and span macros used across the gateway.

use crate::config::ObservabilityConfig;
use crate::errors::{CdnError, Result};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for one purge run.
///
/// ```rust,ignore
/// let span = purge_span!(ProviderKind::Cloudflare, "urls");
/// let span = purge_span!(ProviderKind::Cloudflare, "urls", url_count = 42);
/// ```
#[macro_export]
macro_rules! purge_span {
    ($provider:expr, $scope:expr) => {
        tracing::info_span!(
            "cdn_purge",
            provider = %$provider,
            scope = %$scope,
            purge_id = %uuid::Uuid::new_v4()
        )
    };
    ($provider:expr, $scope:expr, $($field:tt)*) => {
        tracing::info_span!(
            "cdn_purge",
            provider = %$provider,
            scope = %$scope,
            purge_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for a read-only provider operation
#[macro_export]
macro_rules! provider_span {
    ($provider:expr, $operation:expr) => {
        tracing::debug_span!(
            "cdn_provider",
            provider = %$provider,
            operation = %$operation
        )
    };
    ($provider:expr, $operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "cdn_provider",
            provider = %$provider,
            operation = %$operation,
            $($field)*
        )
    };
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this twice is harmless;
/// the second call leaves the existing subscriber in place and returns `Ok`.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive),
        _ => EnvFilter::try_new(&config.log_level),
    }
    .map_err(|e| CdnError::invalid_input(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json_logging {
        builder.json().with_current_span(true).try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(
            service_name = %config.service_name,
            log_level = %config.log_level,
            json = config.json_logging,
            "logging initialised"
        );
    }
    Ok(())
}
