//! # Observability Infrastructure
//!
//! Structured logging through `tracing` and counters through the `metrics`
//! facade. Exporters are the host's business.

pub mod logging;
pub mod metrics;

pub use self::logging::init_logging;
pub use self::metrics::{describe_metrics, ChunkOutcome, MetricsRecorder};

use crate::config::ObservabilityConfig;
use crate::errors::Result;

/// Initialise logging and, when enabled, register metric descriptions
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;
    if config.enable_metrics {
        describe_metrics();
    }
    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        metrics_enabled = %config.enable_metrics,
        "Observability initialized"
    );
    Ok(())
}
