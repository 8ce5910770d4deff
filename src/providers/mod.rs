//! # CDN Provider Clients
//!
//! One client per vendor behind the [`ProviderClient`] trait, plus the
//! closed [`CdnClient`] enum the services construct per request.
//!
//! Clients never retry and never log secrets. REST vendors go through
//! [`http::VendorHttp`]; CloudFront goes through the AWS SDK. Both apply the
//! configured timeouts.

pub mod bunnycdn;
pub mod chunking;
pub mod cloudflare;
pub mod cloudfront;
pub mod http;
pub mod keycdn;
pub mod none;
pub mod paths;

use async_trait::async_trait;

use crate::config::HttpSettings;
use crate::domain::{
    normalize_domain, validate_urls, ProviderConfig, ProviderKind, RawStats, StatsSnapshot,
    StatsWindow, ZoneInfo,
};
use crate::errors::{CdnError, Result};

pub use bunnycdn::BunnyCdnClient;
pub use chunking::{chunk_count, chunk_urls};
pub use cloudflare::CloudflareClient;
pub use cloudfront::CloudFrontClient;
pub use keycdn::KeyCdnClient;
pub use none::NoneClient;

/// Default batch size when a vendor documents no tighter limit
pub const DEFAULT_BATCH_LIMIT: usize = 30;

/// Uniform capability over one CDN vendor
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Maximum number of URLs accepted by one purge exchange
    fn batch_limit(&self) -> usize {
        DEFAULT_BATCH_LIMIT
    }

    /// Local check that the authentication fields are present.
    fn check_credentials(&self) -> Result<()>;

    /// Local check that everything a purge needs is present: credentials
    /// plus a zone identifier or something it can be resolved from.
    fn check_purge_config(&self) -> Result<()> {
        self.check_credentials()
    }

    /// Local check for a whole-zone purge. Vendors whose URL purges are
    /// account-wide still need a zone here.
    fn check_full_purge_config(&self) -> Result<()> {
        self.check_purge_config()
    }

    /// Confirm the credentials with exactly one read-only vendor request.
    async fn validate_credentials(&self) -> Result<()>;

    /// Evict everything cached for the configured zone
    async fn purge_all(&self) -> Result<()>;

    /// One vendor exchange for one chunk of absolute URLs
    async fn purge_batch(&self, urls: &[String]) -> Result<()>;

    /// Purge `urls` chunk by chunk in order, stopping at the first failure.
    async fn purge_urls(&self, urls: &[String]) -> Result<()> {
        validate_urls(urls)?;
        self.check_purge_config()?;
        for chunk in chunk_urls(urls, self.batch_limit()) {
            self.purge_batch(chunk).await?;
        }
        Ok(())
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>>;

    /// Vendor figures for the window; absent metrics stay `None`.
    async fn get_raw_statistics(&self, window: &StatsWindow) -> Result<RawStats>;

    async fn get_statistics(&self, window: &StatsWindow) -> Result<StatsSnapshot> {
        let raw = self.get_raw_statistics(window).await?;
        Ok(StatsSnapshot::from_raw(&raw, window))
    }

    /// Find the zone serving `domain` in the vendor's zone listing
    async fn auto_detect_zone(&self, domain: &str) -> Result<String>;
}

/// Closed set of vendor clients
#[derive(Debug)]
pub enum CdnClient {
    None(NoneClient),
    Cloudflare(CloudflareClient),
    KeyCdn(KeyCdnClient),
    BunnyCdn(BunnyCdnClient),
    CloudFront(CloudFrontClient),
}

macro_rules! dispatch {
    ($self:expr, $client:ident => $call:expr) => {
        match $self {
            CdnClient::None($client) => $call,
            CdnClient::Cloudflare($client) => $call,
            CdnClient::KeyCdn($client) => $call,
            CdnClient::BunnyCdn($client) => $call,
            CdnClient::CloudFront($client) => $call,
        }
    };
}

impl CdnClient {
    /// Build the client for `config.kind`.
    ///
    /// Missing credentials do not fail construction; they are reported by
    /// the first operation that needs them.
    pub fn from_config(config: &ProviderConfig, http: &HttpSettings) -> Result<Self> {
        let client = match config.kind {
            ProviderKind::None => CdnClient::None(NoneClient::new()),
            ProviderKind::Cloudflare => {
                CdnClient::Cloudflare(CloudflareClient::new(config.clone(), http)?)
            }
            ProviderKind::KeyCdn => CdnClient::KeyCdn(KeyCdnClient::new(config.clone(), http)?),
            ProviderKind::BunnyCdn => {
                CdnClient::BunnyCdn(BunnyCdnClient::new(config.clone(), http)?)
            }
            ProviderKind::CloudFront => {
                CdnClient::CloudFront(CloudFrontClient::new(config.clone(), http)?)
            }
        };
        Ok(client)
    }
}

#[async_trait]
impl ProviderClient for CdnClient {
    fn kind(&self) -> ProviderKind {
        dispatch!(self, c => c.kind())
    }

    fn batch_limit(&self) -> usize {
        dispatch!(self, c => c.batch_limit())
    }

    fn check_credentials(&self) -> Result<()> {
        dispatch!(self, c => c.check_credentials())
    }

    fn check_purge_config(&self) -> Result<()> {
        dispatch!(self, c => c.check_purge_config())
    }

    fn check_full_purge_config(&self) -> Result<()> {
        dispatch!(self, c => c.check_full_purge_config())
    }

    async fn validate_credentials(&self) -> Result<()> {
        dispatch!(self, c => c.validate_credentials().await)
    }

    async fn purge_all(&self) -> Result<()> {
        dispatch!(self, c => c.purge_all().await)
    }

    async fn purge_batch(&self, urls: &[String]) -> Result<()> {
        dispatch!(self, c => c.purge_batch(urls).await)
    }

    async fn purge_urls(&self, urls: &[String]) -> Result<()> {
        dispatch!(self, c => c.purge_urls(urls).await)
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>> {
        dispatch!(self, c => c.get_zones().await)
    }

    async fn get_raw_statistics(&self, window: &StatsWindow) -> Result<RawStats> {
        dispatch!(self, c => c.get_raw_statistics(window).await)
    }

    async fn get_statistics(&self, window: &StatsWindow) -> Result<StatsSnapshot> {
        dispatch!(self, c => c.get_statistics(window).await)
    }

    async fn auto_detect_zone(&self, domain: &str) -> Result<String> {
        dispatch!(self, c => c.auto_detect_zone(domain).await)
    }
}

/// Pick the zone whose name or hostnames overlap `domain`.
///
/// Used by vendors whose zone names are labels or origin hosts rather than
/// apex domains. A candidate matches when it equals the domain or one is a
/// subdomain of the other on a label boundary.
pub(crate) fn match_zone_by_hosts<'a, I>(domain: &str, zones: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, Vec<String>)>,
{
    let domain = normalize_domain(domain);
    if domain.is_empty() {
        return None;
    }
    zones.into_iter().find_map(|(id, hosts)| {
        hosts
            .iter()
            .map(|h| normalize_domain(h))
            .filter(|h| !h.is_empty())
            .any(|h| same_site(&h, &domain))
            .then(|| id.to_string())
    })
}

fn same_site(host: &str, domain: &str) -> bool {
    let is_subdomain = |child: &str, parent: &str| {
        child.strip_suffix(parent).is_some_and(|prefix| prefix.ends_with('.'))
    };
    host == domain || is_subdomain(domain, host) || is_subdomain(host, domain)
}

/// Empty domains are caller errors, not lookups
pub(crate) fn require_domain(domain: &str) -> Result<String> {
    let normalized = normalize_domain(domain);
    if normalized.is_empty() {
        return Err(CdnError::invalid_input("Domain cannot be empty"));
    }
    Ok(normalized)
}
