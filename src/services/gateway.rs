//! # CDN Gateway
//!
//! Inbound façade bundling purge, stats and zone services behind one handle.
//! Every call pulls a fresh config snapshot from the [`CredentialStore`], so
//! credential edits made by the host apply to the next operation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{PurgeOrchestrator, StatsAggregator, ZoneResolver};
use crate::config::GatewaySettings;
use crate::credentials::CredentialStore;
use crate::domain::{
    ProviderConfig, ProviderKind, PurgeRequest, PurgeResult, StatsSnapshot, StatsWindow, ZoneInfo,
};
use crate::errors::Result;

#[derive(Clone)]
pub struct CdnGateway {
    store: Arc<dyn CredentialStore>,
    provider_override: Option<ProviderKind>,
    orchestrator: PurgeOrchestrator,
    stats: StatsAggregator,
    zones: ZoneResolver,
}

impl std::fmt::Debug for CdnGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnGateway")
            .field("provider_override", &self.provider_override)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl CdnGateway {
    pub fn new(settings: &GatewaySettings, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            provider_override: None,
            orchestrator: PurgeOrchestrator::from_settings(settings),
            stats: StatsAggregator::new(settings.http.clone()),
            zones: ZoneResolver::new(settings.http.clone()),
        }
    }

    /// Use `kind` instead of the store's active provider
    pub fn with_provider(mut self, kind: ProviderKind) -> Self {
        self.provider_override = Some(kind);
        self
    }

    async fn active_config(&self) -> Result<ProviderConfig> {
        match self.provider_override {
            Some(kind) => self.store.load(kind).await,
            None => self.store.load_active().await,
        }
    }

    pub async fn purge(&self, request: &PurgeRequest) -> PurgeResult {
        self.purge_with_cancel(request, &CancellationToken::new()).await
    }

    pub async fn purge_with_cancel(
        &self,
        request: &PurgeRequest,
        cancel: &CancellationToken,
    ) -> PurgeResult {
        match self.active_config().await {
            Ok(config) => self.orchestrator.purge_with_cancel(&config, request, cancel).await,
            Err(error) => {
                warn!(error = %error, "could not load provider configuration");
                PurgeResult::rejected(self.provider_override.unwrap_or_default(), &error)
            }
        }
    }

    /// Purge the same request on several providers at once
    pub async fn purge_many(
        &self,
        kinds: &[ProviderKind],
        request: &PurgeRequest,
    ) -> Vec<PurgeResult> {
        let mut configs = Vec::with_capacity(kinds.len());
        let mut failures = Vec::new();
        for (index, kind) in kinds.iter().enumerate() {
            match self.store.load(*kind).await {
                Ok(config) => configs.push(config),
                Err(error) => failures.push((index, PurgeResult::rejected(*kind, &error))),
            }
        }

        let mut results = self.orchestrator.purge_many(&configs, request).await;
        for (index, failure) in failures {
            results.insert(index, failure);
        }
        results
    }

    pub async fn get_stats(&self, window: &StatsWindow) -> Result<StatsSnapshot> {
        let config = self.active_config().await?;
        self.stats.get_stats(&config, window).await
    }

    pub async fn resolve_zone(&self, domain: &str) -> Result<String> {
        let config = self.active_config().await?;
        self.zones.resolve(&config, domain).await
    }

    /// One read-only vendor call confirming the configured credentials
    pub async fn validate(&self) -> Result<()> {
        let config = self.active_config().await?;
        self.orchestrator.validate(&config).await
    }

    pub async fn list_zones(&self) -> Result<Vec<ZoneInfo>> {
        let config = self.active_config().await?;
        self.zones.list_zones(&config).await
    }
}
