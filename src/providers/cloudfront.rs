//! Amazon CloudFront client on the AWS SDK.
//!
//! The SDK signs requests and speaks the XML wire format; this module only
//! maps CDN operations onto `CreateInvalidation` and `ListDistributions` and
//! folds SDK errors into the shared taxonomy. Traffic metrics live in
//! CloudWatch, outside this API, so statistics are always an all-zero
//! snapshot.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_cloudfront::config::http::HttpResponse;
use aws_sdk_cloudfront::config::{Credentials, Region};
use aws_sdk_cloudfront::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudfront::types::{DistributionSummary, InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client;
use tracing::debug;

use super::paths::to_root_relative_all;
use super::{match_zone_by_hosts, require_domain, ProviderClient};
use crate::config::HttpSettings;
use crate::domain::{
    keys, ProviderConfig, ProviderKind, RawStats, StatsWindow, ZoneInfo, ZoneStatus,
};
use crate::errors::{CdnError, Result};
use crate::observability::MetricsRecorder;

pub const DEFAULT_REGION: &str = "us-east-1";

const PROVIDER: ProviderKind = ProviderKind::CloudFront;
const MAX_LIST_PAGES: usize = 50;

const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "ExpiredToken",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];
const THROTTLE_ERROR_CODES: &[&str] =
    &["Throttling", "ThrottlingException", "TooManyInvalidationsInProgress"];

#[derive(Debug)]
pub struct CloudFrontClient {
    config: ProviderConfig,
    client: Client,
    timeout_ms: u64,
}

impl CloudFrontClient {
    /// Build the SDK client from the snapshot alone.
    ///
    /// Region, keys and endpoint come from `config`; nothing is read from the
    /// ambient AWS environment or profile files. The SDK never retries.
    pub fn new(config: ProviderConfig, settings: &HttpSettings) -> Result<Self> {
        let region = config.credential(keys::REGION).unwrap_or(DEFAULT_REGION).to_string();
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(settings.connect_timeout())
            .operation_attempt_timeout(settings.timeout())
            .build();

        let mut builder = aws_sdk_cloudfront::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region))
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeouts);

        if let (Some(access_key), Some(secret_key)) =
            (config.credential(keys::ACCESS_KEY), config.credential(keys::SECRET_KEY))
        {
            let session_token = config.credential(keys::SESSION_TOKEN).map(str::to_string);
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                session_token,
                None,
                crate::APP_NAME,
            ));
        }
        if let Some(endpoint) = config.endpoint() {
            url::Url::parse(endpoint).map_err(|e| {
                CdnError::internal(format!("Invalid {} endpoint '{}': {}", PROVIDER, endpoint, e))
            })?;
            builder = builder.endpoint_url(endpoint);
        }

        let timeout_ms = settings.timeout().as_millis() as u64;
        Ok(Self { config, client: Client::from_conf(builder.build()), timeout_ms })
    }

    fn distribution_id(&self) -> Result<&str> {
        self.config.require(keys::DISTRIBUTION_ID)
    }

    /// Await one SDK call, recording it like any other vendor exchange.
    async fn exchange<T, E, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, SdkError<E, HttpResponse>>>,
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let started = Instant::now();
        let outcome = call.await;
        let elapsed = started.elapsed().as_secs_f64();

        let status = match &outcome {
            Ok(_) => 200,
            Err(error) => error.raw_response().map(|r| r.status().as_u16()).unwrap_or(0),
        };
        MetricsRecorder::new().record_vendor_request(PROVIDER, operation, status, elapsed);
        debug!(
            provider = %PROVIDER,
            operation,
            status,
            elapsed_ms = (elapsed * 1000.0) as u64,
            "vendor exchange completed"
        );

        outcome.map_err(|error| self.sdk_error(operation, error))
    }

    fn sdk_error<E>(&self, operation: &str, error: SdkError<E, HttpResponse>) -> CdnError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        match &error {
            SdkError::TimeoutError(_) => {
                return CdnError::timeout(format!("{} {}", PROVIDER, operation), self.timeout_ms)
            }
            SdkError::DispatchFailure(failure) if failure.is_timeout() => {
                return CdnError::timeout(format!("{} {}", PROVIDER, operation), self.timeout_ms)
            }
            SdkError::ServiceError(context) => {
                let raw = context.raw();
                let retry_after =
                    raw.headers().get("retry-after").and_then(|v| v.trim().parse::<u64>().ok());
                return service_error(
                    raw.status().as_u16(),
                    context.err().code(),
                    context.err().message(),
                    retry_after,
                );
            }
            _ => {}
        }

        let status = error.raw_response().map(|r| r.status().as_u16()).unwrap_or(0);
        CdnError::upstream(
            PROVIDER,
            status,
            format!("{} request failed: {}", PROVIDER, DisplayErrorContext(&error)),
        )
    }

    async fn invalidate(&self, paths: Vec<String>) -> Result<()> {
        self.check_purge_config()?;
        let quantity = i32::try_from(paths.len())
            .map_err(|_| CdnError::invalid_input("Too many paths for one invalidation"))?;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(paths))
            .build()
            .map_err(|e| CdnError::internal(format!("Invalid invalidation paths: {}", e)))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(format!("{}-{}", crate::APP_NAME, uuid::Uuid::new_v4()))
            .build()
            .map_err(|e| CdnError::internal(format!("Invalid invalidation batch: {}", e)))?;

        let request = self
            .client
            .create_invalidation()
            .distribution_id(self.distribution_id()?)
            .invalidation_batch(batch)
            .send();
        let output = self.exchange("create_invalidation", request).await?;
        if let Some(invalidation) = output.invalidation() {
            debug!(invalidation_id = %invalidation.id(), "invalidation created");
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for CloudFrontClient {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn check_credentials(&self) -> Result<()> {
        self.config.require(keys::ACCESS_KEY)?;
        self.config.require(keys::SECRET_KEY)?;
        Ok(())
    }

    fn check_purge_config(&self) -> Result<()> {
        self.check_credentials()?;
        self.distribution_id().map(|_| ())
    }

    async fn validate_credentials(&self) -> Result<()> {
        self.check_credentials()?;
        let request = self.client.list_distributions().send();
        self.exchange("validate_credentials", request).await?;
        Ok(())
    }

    async fn purge_all(&self) -> Result<()> {
        self.invalidate(vec!["/*".to_string()]).await
    }

    async fn purge_batch(&self, urls: &[String]) -> Result<()> {
        let paths = to_root_relative_all(urls, self.config.credential(keys::SITE_URL))?;
        self.invalidate(paths).await
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>> {
        self.check_credentials()?;
        let annotations = self.config.zone_annotations();
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let request = self.client.list_distributions().set_marker(marker.take()).send();
            let output = self.exchange("get_zones", request).await?;
            let Some(list) = output.distribution_list() else {
                break;
            };

            zones.extend(list.items().iter().map(|s| distribution_info(s).annotated(&annotations)));

            marker = list.next_marker().filter(|m| !m.is_empty()).map(str::to_string);
            if !list.is_truncated() || marker.is_none() {
                break;
            }
        }

        Ok(zones)
    }

    async fn get_raw_statistics(&self, _window: &StatsWindow) -> Result<RawStats> {
        self.check_credentials()?;
        Ok(RawStats::default())
    }

    async fn auto_detect_zone(&self, domain: &str) -> Result<String> {
        let domain = require_domain(domain)?;
        let zones = self.get_zones().await?;
        let candidates = zones.iter().map(|z| {
            let mut hosts = vec![z.name.clone()];
            hosts.extend(z.extra.get("domain_name").cloned());
            if let Some(aliases) = z.extra.get("aliases") {
                hosts.extend(aliases.split(',').map(str::to_string));
            }
            (z.id.as_str(), hosts)
        });
        match_zone_by_hosts(&domain, candidates)
            .ok_or_else(|| CdnError::not_found("CloudFront distribution", domain.as_str()))
    }
}

/// The first alias names the distribution; the CloudFront host is kept in
/// `extra` for matching.
fn distribution_info(summary: &DistributionSummary) -> ZoneInfo {
    let aliases: Vec<&str> = summary
        .aliases()
        .map(|a| a.items().iter().map(|c| c.trim()).filter(|c| !c.is_empty()).collect())
        .unwrap_or_default();
    let domain_name = summary.domain_name();
    let name = aliases.first().copied().unwrap_or(domain_name);

    let info = ZoneInfo::new(summary.id(), name, ZoneStatus::from_vendor(summary.status()))
        .with_extra("domain_name", domain_name);
    if aliases.is_empty() {
        info
    } else {
        info.with_extra("aliases", aliases.join(","))
    }
}

fn service_error(
    status: u16,
    code: Option<&str>,
    message: Option<&str>,
    retry_after: Option<u64>,
) -> CdnError {
    let code = code.unwrap_or_default();
    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match code {
            "" => format!("{} returned HTTP {}", PROVIDER, status),
            code => format!("{} returned {} (HTTP {})", PROVIDER, code, status),
        });

    if AUTH_ERROR_CODES.contains(&code) || matches!(status, 401 | 403) {
        CdnError::auth(PROVIDER, message)
    } else if THROTTLE_ERROR_CODES.contains(&code) || status == 429 {
        CdnError::rate_limited(PROVIDER, message).with_retry_after(retry_after)
    } else {
        CdnError::upstream(PROVIDER, status, message)
    }
}
