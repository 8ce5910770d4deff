//! Analytics read path: one normalized [`StatsSnapshot`] regardless of vendor.

use tracing::{debug, Instrument};

use crate::config::HttpSettings;
use crate::domain::{ProviderConfig, StatsSnapshot, StatsWindow};
use crate::errors::Result;
use crate::providers::{CdnClient, ProviderClient};

#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    http: HttpSettings,
}

impl StatsAggregator {
    pub fn new(http: HttpSettings) -> Self {
        Self { http }
    }

    /// Fetch and normalize analytics for `window`.
    ///
    /// Missing vendor figures become 0 and the hit ratio always lands in
    /// [0, 100].
    pub async fn get_stats(
        &self,
        config: &ProviderConfig,
        window: &StatsWindow,
    ) -> Result<StatsSnapshot> {
        let client = CdnClient::from_config(config, &self.http)?;
        self.get_stats_with_client(&client, window).await
    }

    pub async fn get_stats_with_client(
        &self,
        client: &dyn ProviderClient,
        window: &StatsWindow,
    ) -> Result<StatsSnapshot> {
        client.check_credentials()?;

        let span = crate::provider_span!(client.kind(), "get_statistics");
        let snapshot = client.get_statistics(window).instrument(span).await?;
        debug!(
            provider = %client.kind(),
            requests = snapshot.requests_total,
            hit_ratio = snapshot.cache_hit_ratio_percent,
            "statistics fetched"
        );
        Ok(snapshot)
    }
}
