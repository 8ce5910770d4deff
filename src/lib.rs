//! # cachegate
//!
//! Provider-agnostic CDN cache invalidation. One API purges, lists zones and
//! reads analytics on Cloudflare, KeyCDN, BunnyCDN and CloudFront, plus a
//! no-op provider for sites without a CDN.
//!
//! ## Architecture
//!
//! ```text
//! CdnGateway → PurgeOrchestrator / StatsAggregator / ZoneResolver
//!      ↓                         ↓
//! CredentialStore         CdnClient (one per vendor) → vendor REST API
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cachegate::{PurgeOrchestrator, ProviderConfig, ProviderKind, PurgeRequest};
//! use cachegate::domain::keys;
//!
//! # async fn run() {
//! let config = ProviderConfig::new(ProviderKind::Cloudflare)
//!     .with_credential(keys::API_TOKEN, "token")
//!     .with_credential(keys::ZONE_ID, "023e105f4ecef8ad9ca31a8372d0c353");
//! let request = PurgeRequest::urls(["https://example.com/app.css"]);
//! let result = PurgeOrchestrator::default().purge(&config, &request).await;
//! assert!(result.chunks_attempted() <= 1);
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod providers;
pub mod services;

// Re-export commonly used types and traits
pub use config::GatewaySettings;
pub use credentials::{CredentialStore, EnvCredentialStore, StaticCredentialStore};
pub use domain::{
    ProviderConfig, ProviderKind, PurgeRequest, PurgeResult, PurgeScope, StatsSnapshot,
    StatsWindow, ZoneInfo,
};
pub use errors::{CdnError, ErrorKind, Result};
pub use providers::{CdnClient, ProviderClient};
pub use services::{CdnGateway, PurgeOrchestrator, StatsAggregator, ZoneResolver};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "cachegate");
    }
}
