//! "No CDN" provider: every operation succeeds locally.

use async_trait::async_trait;

use super::ProviderClient;
use crate::domain::{ProviderKind, RawStats, StatsWindow, ZoneInfo};
use crate::errors::{CdnError, Result};

#[derive(Debug, Clone, Default)]
pub struct NoneClient;

impl NoneClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderClient for NoneClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::None
    }

    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }

    async fn validate_credentials(&self) -> Result<()> {
        Ok(())
    }

    async fn purge_all(&self) -> Result<()> {
        Ok(())
    }

    async fn purge_batch(&self, _urls: &[String]) -> Result<()> {
        Ok(())
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>> {
        Ok(Vec::new())
    }

    async fn get_raw_statistics(&self, _window: &StatsWindow) -> Result<RawStats> {
        Ok(RawStats::default())
    }

    async fn auto_detect_zone(&self, domain: &str) -> Result<String> {
        Err(CdnError::not_found("zone", domain))
    }
}
