//! BunnyCDN API client.
//!
//! Authenticates with the account API key in the `AccessKey` header. The
//! URL purge endpoint takes a single `url` query parameter, so the batch
//! limit is one.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::RequestBuilder;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::http::{default_message, json_id, json_u64, status_error, VendorHttp, VendorResponse};
use super::{match_zone_by_hosts, require_domain, ProviderClient};
use crate::config::HttpSettings;
use crate::domain::{
    keys, ProviderConfig, ProviderKind, RawStats, StatsWindow, ZoneInfo, ZoneStatus,
};
use crate::errors::{CdnError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.bunny.net";

const PROVIDER: ProviderKind = ProviderKind::BunnyCdn;

#[derive(Debug)]
pub struct BunnyCdnClient {
    config: ProviderConfig,
    http: VendorHttp,
    zone_id: OnceCell<String>,
}

impl BunnyCdnClient {
    pub fn new(config: ProviderConfig, settings: &HttpSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.credential(keys::API_KEY) {
            let mut value = HeaderValue::from_str(key).map_err(|_| {
                CdnError::invalid_input("BunnyCDN API key contains invalid characters")
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("accesskey"), value);
        }

        let endpoint = config.endpoint().unwrap_or(DEFAULT_ENDPOINT).to_string();
        let http = VendorHttp::new(PROVIDER, &endpoint, settings, headers)?;
        Ok(Self { config, http, zone_id: OnceCell::new() })
    }

    /// Configured pull zone id, or the id of the pull zone named `zone_name`.
    async fn zone_id(&self) -> Result<String> {
        if let Some(id) = self.config.credential(keys::ZONE_ID) {
            return Ok(id.to_string());
        }
        let name = self
            .config
            .credential(keys::ZONE_NAME)
            .ok_or_else(|| CdnError::missing_credentials(PROVIDER, keys::ZONE_ID))?;

        self.zone_id
            .get_or_try_init(|| async {
                let zones = self.get_zones().await?;
                let id = zones
                    .into_iter()
                    .find(|z| {
                        z.extra
                            .get("pull_zone_name")
                            .unwrap_or(&z.name)
                            .eq_ignore_ascii_case(name)
                    })
                    .map(|z| z.id)
                    .ok_or_else(|| CdnError::not_found("BunnyCDN pull zone", name))?;
                debug!(zone_name = %name, zone_id = %id, "resolved pull zone by name");
                Ok(id)
            })
            .await
            .cloned()
    }

    async fn call(&self, operation: &str, request: RequestBuilder) -> Result<VendorResponse> {
        let response = self.http.send(operation, request).await?;
        if response.is_success() {
            return Ok(response);
        }
        Err(status_error(PROVIDER, &response, error_message(&response)))
    }

    async fn call_json(&self, operation: &str, request: RequestBuilder) -> Result<Value> {
        self.call(operation, request).await?.json(PROVIDER)
    }
}

#[async_trait]
impl ProviderClient for BunnyCdnClient {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn batch_limit(&self) -> usize {
        1
    }

    fn check_credentials(&self) -> Result<()> {
        self.config.require(keys::API_KEY).map(|_| ())
    }

    /// URL purges are account-wide and need only the key.
    fn check_purge_config(&self) -> Result<()> {
        self.check_credentials()
    }

    /// A full purge targets one pull zone, given by id or by a name that is
    /// resolved on first use.
    fn check_full_purge_config(&self) -> Result<()> {
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
        self.call("validate_credentials", self.http.get("pullzone")).await?;
        Ok(())
    }

    async fn purge_all(&self) -> Result<()> {
        self.check_credentials()?;
        let zone_id = self.zone_id().await?;
        let path = format!("pullzone/{}/purgeCache", zone_id);
        self.call("purge_all", self.http.post(&path)).await?;
        Ok(())
    }

    async fn purge_batch(&self, urls: &[String]) -> Result<()> {
        self.check_credentials()?;
        let [url] = urls else {
            return Err(CdnError::invalid_input(format!(
                "BunnyCDN purges one URL per request, got {}",
                urls.len()
            )));
        };
        let request = self.http.post("purge").query(&[("url", url.trim())]);
        self.call("purge_batch", request).await?;
        Ok(())
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>> {
        self.check_credentials()?;
        let body = self.call_json("get_zones", self.http.get("pullzone")).await?;
        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("Items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let annotations = self.config.zone_annotations();
        Ok(items
            .iter()
            .filter_map(pull_zone_info)
            .map(|zone| zone.annotated(&annotations))
            .collect())
    }

    async fn get_raw_statistics(&self, window: &StatsWindow) -> Result<RawStats> {
        self.check_credentials()?;
        let zone_id = self.zone_id().await?;
        let request = self.http.get("statistics").query(&[
            ("pullZone", zone_id),
            ("dateFrom", window.start.format("%Y-%m-%d").to_string()),
            ("dateTo", window.end.format("%Y-%m-%d").to_string()),
        ]);
        let body = self.call_json("get_statistics", request).await?;

        Ok(RawStats {
            requests_total: json_u64(body.get("TotalRequestsServed")),
            cached_requests: None,
            bandwidth_total_bytes: json_u64(body.get("TotalBandwidthUsed")),
            threats_blocked: Some(0),
            hit_ratio_percent: body.get("CacheHitRate").and_then(Value::as_f64),
        })
    }

    async fn auto_detect_zone(&self, domain: &str) -> Result<String> {
        let domain = require_domain(domain)?;
        let zones = self.get_zones().await?;
        let candidates = zones.iter().map(|z| {
            let mut hosts = vec![z.name.clone()];
            if let Some(list) = z.extra.get("hostnames") {
                hosts.extend(list.split(',').map(str::to_string));
            }
            (z.id.as_str(), hosts)
        });
        match_zone_by_hosts(&domain, candidates)
            .ok_or_else(|| CdnError::not_found("BunnyCDN pull zone", domain.as_str()))
    }
}

fn pull_zone_info(zone: &Value) -> Option<ZoneInfo> {
    let id = json_id(zone.get("Id"))?;
    let name = zone.get("Name").and_then(Value::as_str).unwrap_or_default();
    let enabled = zone.get("Enabled").and_then(Value::as_bool).unwrap_or(true);
    let suspended = zone.get("Suspended").and_then(Value::as_bool).unwrap_or(false);
    let status = match (enabled, suspended) {
        (_, true) => ZoneStatus::Other("suspended".to_string()),
        (true, false) => ZoneStatus::Active,
        (false, false) => ZoneStatus::Other("disabled".to_string()),
    };

    let hostnames: Vec<&str> = zone
        .get("Hostnames")
        .and_then(Value::as_array)
        .map(|hosts| {
            hosts.iter().filter_map(|h| h.get("Value").and_then(Value::as_str)).collect()
        })
        .unwrap_or_default();

    let mut info = ZoneInfo::new(id, name, status).with_extra("pull_zone_name", name);
    if !hostnames.is_empty() {
        info = info.with_extra("hostnames", hostnames.join(","));
    }
    Some(info)
}

/// Bunny error bodies look like `{"ErrorKey": "...", "Message": "..."}`
fn error_message(response: &VendorResponse) -> String {
    serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|v| v.get("Message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_message(PROVIDER, response))
}
