//! # Configuration Management
//!
//! Gateway settings (HTTP timeouts, retry policy, logging) loaded from an
//! optional file and `CACHEGATE__*` environment variables.

pub mod settings;

pub use settings::{GatewaySettings, HttpSettings, ObservabilityConfig, RetryConfig, ENV_PREFIX};
