//! Zone resolution: the configured id wins, otherwise ask the vendor.
//!
//! Detected ids are handed back to the caller and never written into the
//! config; hosts persist them through `ProviderConfig::with_credential`.

use tracing::{debug, info, Instrument};

use crate::config::HttpSettings;
use crate::domain::{ProviderConfig, ZoneInfo};
use crate::errors::Result;
use crate::providers::{require_domain, CdnClient, ProviderClient};

#[derive(Debug, Clone, Default)]
pub struct ZoneResolver {
    http: HttpSettings,
}

impl ZoneResolver {
    pub fn new(http: HttpSettings) -> Self {
        Self { http }
    }

    pub async fn resolve(&self, config: &ProviderConfig, domain: &str) -> Result<String> {
        if let Some(id) = config.explicit_zone_id() {
            debug!(provider = %config.kind, zone_id = %id, "using configured zone id");
            return Ok(id.to_string());
        }
        let client = CdnClient::from_config(config, &self.http)?;
        self.detect_with_client(&client, domain).await
    }

    /// Auto-detect against an existing client, skipping the explicit-id check
    pub async fn detect_with_client(
        &self,
        client: &dyn ProviderClient,
        domain: &str,
    ) -> Result<String> {
        let domain = require_domain(domain)?;
        client.check_credentials()?;

        let span = crate::provider_span!(client.kind(), "auto_detect_zone", domain = %domain);
        let zone_id = client.auto_detect_zone(&domain).instrument(span).await?;
        info!(provider = %client.kind(), domain = %domain, zone_id = %zone_id, "zone detected");
        Ok(zone_id)
    }

    pub async fn list_zones(&self, config: &ProviderConfig) -> Result<Vec<ZoneInfo>> {
        let client = CdnClient::from_config(config, &self.http)?;
        client.check_credentials()?;
        let span = crate::provider_span!(config.kind, "get_zones");
        client.get_zones().instrument(span).await
    }
}
