//! Cloudflare API v4 client.
//!
//! Authenticates with a scoped API token (`Authorization: Bearer`) or the
//! legacy global key (`X-Auth-Email` + `X-Auth-Key`). Every response uses the
//! `{success, errors, result}` envelope, so failures are detected from the
//! payload as well as the HTTP status.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::http::{default_message, json_u64, status_error, VendorHttp, VendorResponse};
use super::{require_domain, ProviderClient};
use crate::config::HttpSettings;
use crate::domain::{
    keys, normalize_domain, ProviderConfig, ProviderKind, RawStats, StatsWindow, ZoneInfo,
    ZoneStatus,
};
use crate::errors::{CdnError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.cloudflare.com/client/v4/";

const PROVIDER: ProviderKind = ProviderKind::Cloudflare;
const ZONES_PER_PAGE: u32 = 50;
const MAX_ZONE_PAGES: u32 = 200;

/// Error codes Cloudflare uses for rejected or insufficient credentials
const AUTH_ERROR_CODES: &[u64] = &[6003, 6111, 9103, 9106, 9109, 10000, 10001];
const RATE_LIMIT_CODE: u64 = 971;

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CloudflareZone {
    id: String,
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    plan: Option<Value>,
}

#[derive(Debug)]
pub struct CloudflareClient {
    config: ProviderConfig,
    http: VendorHttp,
    uses_token: bool,
    zone_id: OnceCell<String>,
}

impl CloudflareClient {
    pub fn new(config: ProviderConfig, settings: &HttpSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let uses_token = config.credential(keys::API_TOKEN).is_some();

        if let Some(token) = config.credential(keys::API_TOKEN) {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        } else if let (Some(email), Some(key)) =
            (config.credential(keys::EMAIL), config.credential(keys::API_KEY))
        {
            headers.insert(HeaderName::from_static("x-auth-email"), header_value(email)?);
            headers.insert(HeaderName::from_static("x-auth-key"), header_value(key)?);
        }

        let endpoint = config.endpoint().unwrap_or(DEFAULT_ENDPOINT).to_string();
        let http = VendorHttp::new(PROVIDER, &endpoint, settings, headers)?;

        Ok(Self { config, http, uses_token, zone_id: OnceCell::new() })
    }

    /// Configured zone id, or the id of the zone named by `zone_name`.
    async fn zone_id(&self) -> Result<String> {
        if let Some(id) = self.config.credential(keys::ZONE_ID) {
            return Ok(id.to_string());
        }
        let name = self
            .config
            .credential(keys::ZONE_NAME)
            .ok_or_else(|| CdnError::missing_credentials(PROVIDER, keys::ZONE_ID))?;
        let wanted = normalize_domain(name);

        self.zone_id
            .get_or_try_init(|| async {
                let zones = self.get_zones().await?;
                let id = zones
                    .into_iter()
                    .find(|z| normalize_domain(&z.name) == wanted)
                    .map(|z| z.id)
                    .ok_or_else(|| CdnError::not_found("Cloudflare zone", name))?;
                debug!(zone_name = %name, zone_id = %id, "resolved Cloudflare zone by name");
                Ok(id)
            })
            .await
            .cloned()
    }

    /// Send and unwrap the envelope, mapping any vendor failure.
    async fn call(&self, operation: &str, request: RequestBuilder) -> Result<Envelope> {
        let response = self.http.send(operation, request).await?;
        let envelope: Option<Envelope> = serde_json::from_str(&response.body).ok();

        match envelope {
            Some(envelope) if response.is_success() && envelope.success => Ok(envelope),
            Some(envelope) => Err(envelope_error(&response, &envelope)),
            None if response.is_success() => {
                let message = default_message(PROVIDER, &response);
                Err(CdnError::upstream(
                    PROVIDER,
                    response.status.as_u16(),
                    format!("Unexpected response from cloudflare: {}", message),
                ))
            }
            None => Err(status_error(PROVIDER, &response, default_message(PROVIDER, &response))),
        }
    }

    async fn purge(&self, body: Value) -> Result<()> {
        self.check_purge_config()?;
        let zone_id = self.zone_id().await?;
        let request = self.http.post(&format!("zones/{}/purge_cache", zone_id)).json(&body);
        self.call("purge_cache", request).await?;
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for CloudflareClient {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn check_credentials(&self) -> Result<()> {
        if self.uses_token {
            return Ok(());
        }
        match (self.config.credential(keys::EMAIL), self.config.credential(keys::API_KEY)) {
            (Some(_), Some(_)) => Ok(()),
            (Some(_), None) => Err(CdnError::missing_credentials(PROVIDER, keys::API_KEY)),
            (None, Some(_)) => Err(CdnError::missing_credentials(PROVIDER, keys::EMAIL)),
            (None, None) => Err(CdnError::missing_credentials(PROVIDER, keys::API_TOKEN)),
        }
    }

    fn check_purge_config(&self) -> Result<()> {
        self.check_credentials()?;
        if self.config.credential(keys::ZONE_ID).is_none()
            && self.config.credential(keys::ZONE_NAME).is_none()
        {
            return Err(CdnError::missing_credentials(PROVIDER, keys::ZONE_ID));
        }
        Ok(())
    }

    async fn validate_credentials(&self) -> Result<()> {
        self.check_credentials()?;
        let path = if self.uses_token { "user/tokens/verify" } else { "user" };
        self.call("validate_credentials", self.http.get(path)).await?;
        Ok(())
    }

    async fn purge_all(&self) -> Result<()> {
        self.purge(json!({ "purge_everything": true })).await?;
        info!(provider = %PROVIDER, "purged entire zone");
        Ok(())
    }

    async fn purge_batch(&self, urls: &[String]) -> Result<()> {
        self.purge(json!({ "files": urls })).await
    }

    fn batch_limit(&self) -> usize {
        30
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>> {
        self.check_credentials()?;
        let mut zones = Vec::new();
        let mut page = 1;

        loop {
            let path = format!("zones?per_page={}&page={}", ZONES_PER_PAGE, page);
            let envelope = self.call("get_zones", self.http.get(&path)).await?;
            let batch: Vec<CloudflareZone> = serde_json::from_value(envelope.result)
                .map_err(|e| {
                    CdnError::upstream(PROVIDER, 200, format!("Unexpected zone listing: {}", e))
                })?;
            let fetched = batch.len();

            zones.extend(batch.into_iter().map(|zone| {
                let status = ZoneStatus::from_vendor(&zone.status);
                let plan = zone.plan.as_ref().and_then(|p| p.get("name")).and_then(Value::as_str);
                let info = ZoneInfo::new(zone.id.as_str(), zone.name.as_str(), status);
                match plan {
                    Some(plan) => info.with_extra("plan", plan),
                    None => info,
                }
            }));

            let total_pages = envelope.result_info.and_then(|i| i.total_pages).unwrap_or(page);
            if fetched == 0 || page >= total_pages || page >= MAX_ZONE_PAGES {
                break;
            }
            page += 1;
        }

        let annotations = self.config.zone_annotations();
        Ok(zones.into_iter().map(|zone| zone.annotated(&annotations)).collect())
    }

    async fn get_raw_statistics(&self, window: &StatsWindow) -> Result<RawStats> {
        self.check_purge_config()?;
        let zone_id = self.zone_id().await?;
        let request = self.http.get(&format!("zones/{}/analytics/dashboard", zone_id)).query(&[
            ("since", window.start.to_rfc3339()),
            ("until", window.end.to_rfc3339()),
            ("continuous", "true".to_string()),
        ]);
        let envelope = self.call("get_statistics", request).await?;
        let totals = envelope.result.get("totals");
        let metric = |group: &str, field: &str| {
            json_u64(totals.and_then(|t| t.get(group)).and_then(|g| g.get(field)))
        };

        Ok(RawStats {
            requests_total: metric("requests", "all"),
            cached_requests: metric("requests", "cached"),
            bandwidth_total_bytes: metric("bandwidth", "all"),
            threats_blocked: metric("threats", "all"),
            hit_ratio_percent: None,
        })
    }

    /// Exact match, or the longest zone the domain is a subdomain of.
    async fn auto_detect_zone(&self, domain: &str) -> Result<String> {
        let domain = require_domain(domain)?;
        let zones = self.get_zones().await?;

        zones
            .iter()
            .map(|z| (normalize_domain(&z.name), z))
            .filter(|(name, _)| {
                !name.is_empty() && (*name == domain || domain.ends_with(&format!(".{}", name)))
            })
            .max_by_key(|(name, _)| name.len())
            .map(|(_, zone)| zone.id.clone())
            .ok_or_else(|| CdnError::not_found("Cloudflare zone", domain.as_str()))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| CdnError::invalid_input("Cloudflare credential contains invalid characters"))?;
    header.set_sensitive(true);
    Ok(header)
}

fn envelope_error(response: &VendorResponse, envelope: &Envelope) -> CdnError {
    let message = if envelope.errors.is_empty() {
        default_message(PROVIDER, response)
    } else {
        envelope.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
    };
    let codes: Vec<u64> = envelope.errors.iter().filter_map(|e| json_u64(Some(&e.code))).collect();

    if codes.iter().any(|c| AUTH_ERROR_CODES.contains(c)) {
        CdnError::auth(PROVIDER, message)
    } else if codes.contains(&RATE_LIMIT_CODE) {
        CdnError::rate_limited(PROVIDER, message).with_retry_after(response.retry_after)
    } else {
        status_error(PROVIDER, response, message)
    }
}
