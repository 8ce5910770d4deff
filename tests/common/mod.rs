//! Common test utilities for all integration tests.
//!
//! Mock vendors run on wiremock; request-count expectations double as
//! call-count spies and are verified when the server drops.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use cachegate::config::{GatewaySettings, HttpSettings, RetryConfig};
use cachegate::domain::keys;
use cachegate::{ProviderConfig, ProviderKind, PurgeOrchestrator};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const CF_ZONE: &str = "023e105f4ecef8ad9ca31a8372d0c353";

/// Short timeouts so a hung mock fails fast
pub fn test_http() -> HttpSettings {
    HttpSettings { timeout_seconds: 5, connect_timeout_seconds: 2, ..Default::default() }
}

pub fn test_settings() -> GatewaySettings {
    GatewaySettings { http: test_http(), ..Default::default() }
}

pub fn orchestrator() -> PurgeOrchestrator {
    PurgeOrchestrator::new(test_http(), RetryConfig::default())
}

pub fn orchestrator_with_retries(max_retries: u32) -> PurgeOrchestrator {
    PurgeOrchestrator::new(
        test_http(),
        RetryConfig {
            max_retries,
            initial_backoff_ms: 5,
            max_backoff_ms: 20,
            respect_retry_after: false,
            ..Default::default()
        },
    )
}

pub fn urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://example.com/static/file-{:03}.js", i)).collect()
}

pub fn cloudflare_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::Cloudflare)
        .with_credential(keys::API_TOKEN, "cf-token")
        .with_credential(keys::ZONE_ID, CF_ZONE)
        .with_endpoint(server.uri())
}

pub fn keycdn_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::KeyCdn)
        .with_credential(keys::API_KEY, "sk_test")
        .with_credential(keys::ZONE_ID, "1234")
        .with_credential(keys::SITE_URL, "https://example.com")
        .with_endpoint(server.uri())
}

pub fn bunny_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::BunnyCdn)
        .with_credential(keys::API_KEY, "bunny-key")
        .with_endpoint(server.uri())
}

pub fn cloudfront_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::CloudFront)
        .with_credential(keys::ACCESS_KEY, "AKIDEXAMPLE")
        .with_credential(keys::SECRET_KEY, "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
        .with_credential(keys::DISTRIBUTION_ID, "E2QWRUHEXAMPLE")
        .with_endpoint(server.uri())
}

/// Successful Cloudflare envelope
pub fn cf_ok(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

/// Failed Cloudflare envelope with one error
pub fn cf_error(code: u64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null
    })
}

pub fn keycdn_ok(data: Value) -> Value {
    json!({ "status": "success", "description": "ok", "data": data })
}
