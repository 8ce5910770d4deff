//! KeyCDN API client.
//!
//! HTTP Basic auth with the API key as username and an empty password.
//! KeyCDN purges by root-relative path, so absolute URLs are translated
//! against the configured `site_url` before they are sent.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::{default_message, json_id, json_u64, status_error, VendorHttp};
use super::paths::to_root_relative_all;
use super::{match_zone_by_hosts, require_domain, ProviderClient};
use crate::config::HttpSettings;
use crate::domain::{
    keys, ProviderConfig, ProviderKind, RawStats, StatsWindow, ZoneInfo, ZoneStatus,
};
use crate::errors::{CdnError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.keycdn.com";

const PROVIDER: ProviderKind = ProviderKind::KeyCdn;

#[derive(Debug, Default, Deserialize)]
struct KeyCdnResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug)]
pub struct KeyCdnClient {
    config: ProviderConfig,
    http: VendorHttp,
}

impl KeyCdnClient {
    pub fn new(config: ProviderConfig, settings: &HttpSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.credential(keys::API_KEY) {
            let encoded = STANDARD.encode(format!("{}:", key));
            let mut value = HeaderValue::from_str(&format!("Basic {}", encoded)).map_err(|_| {
                CdnError::invalid_input("KeyCDN API key contains invalid characters")
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let endpoint = config.endpoint().unwrap_or(DEFAULT_ENDPOINT).to_string();
        let http = VendorHttp::new(PROVIDER, &endpoint, settings, headers)?;
        Ok(Self { config, http })
    }

    fn zone_id(&self) -> Result<&str> {
        self.config.require(keys::ZONE_ID)
    }

    /// KeyCDN reports failures as `{"status":"error","description":...}`,
    /// sometimes with a 200 status.
    async fn call(&self, operation: &str, request: RequestBuilder) -> Result<KeyCdnResponse> {
        let response = self.http.send(operation, request).await?;
        let parsed: Option<KeyCdnResponse> = serde_json::from_str(&response.body).ok();
        let message = parsed
            .as_ref()
            .map(|p| p.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_message(PROVIDER, &response));

        if !response.is_success() {
            return Err(status_error(PROVIDER, &response, message));
        }
        match parsed {
            Some(body) if body.status.eq_ignore_ascii_case("success") => Ok(body),
            Some(_) => Err(CdnError::upstream(PROVIDER, response.status.as_u16(), message)),
            None => Err(CdnError::upstream(
                PROVIDER,
                response.status.as_u16(),
                format!("Unexpected response from keycdn: {}", message),
            )),
        }
    }

    /// Sum each of `fields` over the rows of one report
    async fn sum_report(
        &self,
        report: &str,
        window: &StatsWindow,
        fields: &[&str],
    ) -> Result<Vec<u64>> {
        let zone_id = self.zone_id()?;
        let request = self.http.get(&format!("reports/{}/{}.json", report, zone_id)).query(&[
            ("start", window.start.timestamp().to_string()),
            ("end", window.end.timestamp().to_string()),
        ]);
        let body = self.call(report, request).await?;
        let rows = body.data.get("stats").and_then(Value::as_array).cloned().unwrap_or_default();

        Ok(fields
            .iter()
            .map(|field| rows.iter().filter_map(|row| json_u64(row.get(*field))).sum::<u64>())
            .collect())
    }
}

#[async_trait]
impl ProviderClient for KeyCdnClient {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    fn check_credentials(&self) -> Result<()> {
        self.config.require(keys::API_KEY).map(|_| ())
    }

    fn check_purge_config(&self) -> Result<()> {
        self.check_credentials()?;
        self.zone_id().map(|_| ())
    }

    async fn validate_credentials(&self) -> Result<()> {
        self.check_credentials()?;
        self.call("validate_credentials", self.http.get("zones.json")).await?;
        Ok(())
    }

    async fn purge_all(&self) -> Result<()> {
        self.check_purge_config()?;
        let path = format!("zones/purge/{}.json", self.zone_id()?);
        self.call("purge_all", self.http.get(&path)).await?;
        Ok(())
    }

    async fn purge_batch(&self, urls: &[String]) -> Result<()> {
        self.check_purge_config()?;
        let paths = to_root_relative_all(urls, self.config.credential(keys::SITE_URL))?;
        let path = format!("zones/purgeurl/{}.json", self.zone_id()?);
        self.call("purge_batch", self.http.post(&path).json(&json!({ "urls": paths }))).await?;
        Ok(())
    }

    async fn get_zones(&self) -> Result<Vec<ZoneInfo>> {
        self.check_credentials()?;
        let body = self.call("get_zones", self.http.get("zones.json")).await?;
        let zones = body.data.get("zones").and_then(Value::as_array).cloned().unwrap_or_default();
        let annotations = self.config.zone_annotations();

        Ok(zones
            .iter()
            .filter_map(|zone| {
                let id = json_id(zone.get("id"))?;
                let zone_name = zone.get("name").and_then(Value::as_str).unwrap_or_default();
                let origin = zone.get("originurl").and_then(Value::as_str).unwrap_or_default();
                let origin_host = url::Url::parse(origin)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string));
                let name = origin_host.unwrap_or_else(|| zone_name.to_string());
                let status = ZoneStatus::from_vendor(
                    zone.get("status").and_then(Value::as_str).unwrap_or_default(),
                );

                let mut info = ZoneInfo::new(id, name, status).with_extra("zone_name", zone_name);
                if !origin.is_empty() {
                    info = info.with_extra("origin_url", origin);
                }
                Some(info.annotated(&annotations))
            })
            .collect())
    }

    async fn get_raw_statistics(&self, window: &StatsWindow) -> Result<RawStats> {
        self.check_purge_config()?;
        let traffic = self.sum_report("traffic", window, &["amount"]).await?;
        let states =
            self.sum_report("statestats", window, &["totalcachehit", "totalcachemiss"]).await?;

        let hits = states.first().copied().unwrap_or(0);
        let misses = states.get(1).copied().unwrap_or(0);
        Ok(RawStats {
            requests_total: Some(hits.saturating_add(misses)),
            cached_requests: Some(hits),
            bandwidth_total_bytes: traffic.first().copied(),
            threats_blocked: Some(0),
            hit_ratio_percent: None,
        })
    }

    async fn auto_detect_zone(&self, domain: &str) -> Result<String> {
        let domain = require_domain(domain)?;
        let zones = self.get_zones().await?;
        let candidates = zones.iter().map(|z| {
            let mut hosts = vec![z.name.clone()];
            hosts.extend(z.extra.get("zone_name").cloned());
            (z.id.as_str(), hosts)
        });
        match_zone_by_hosts(&domain, candidates)
            .ok_or_else(|| CdnError::not_found("KeyCDN zone", domain.as_str()))
    }
}
