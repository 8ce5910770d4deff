//! Transport timeouts versus other transport failures.

mod common;

use std::time::Duration;

use cachegate::config::{HttpSettings, RetryConfig};
use cachegate::domain::keys;
use cachegate::{ErrorKind, ProviderConfig, ProviderKind, PurgeOrchestrator, PurgeRequest};
use common::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn impatient() -> PurgeOrchestrator {
    PurgeOrchestrator::new(
        HttpSettings { timeout_seconds: 1, connect_timeout_seconds: 1, ..Default::default() },
        RetryConfig::default(),
    )
}

#[tokio::test]
async fn test_slow_vendor_surfaces_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/zones/{}/purge_cache", CF_ZONE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(cf_ok(json!({"id": CF_ZONE})))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = impatient()
        .purge(&cloudflare_config(&server), &PurgeRequest::urls(urls(40)))
        .await;

    assert!(!result.success());
    assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(result.chunks_attempted(), 1);
    assert_eq!(result.chunks_failed(), 1);
    assert!(result.error().unwrap().message.contains("after 1000ms"));
}

#[tokio::test]
async fn test_slow_vendor_retried_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/purge/1234.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(keycdn_ok(json!({})))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zones/purge/1234.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(keycdn_ok(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = PurgeOrchestrator::new(
        HttpSettings { timeout_seconds: 1, connect_timeout_seconds: 1, ..Default::default() },
        RetryConfig { max_retries: 1, initial_backoff_ms: 5, ..Default::default() },
    );
    let result = orchestrator.purge(&keycdn_config(&server), &PurgeRequest::full()).await;

    assert!(result.success(), "{:?}", result);
    assert_eq!(result.chunks_attempted(), 1);
}

#[tokio::test]
async fn test_refused_connection_is_upstream_not_timeout() {
    let config = ProviderConfig::new(ProviderKind::Cloudflare)
        .with_credential(keys::API_TOKEN, "cf-token")
        .with_credential(keys::ZONE_ID, CF_ZONE)
        .with_endpoint("http://127.0.0.1:9");

    let result = impatient().purge(&config, &PurgeRequest::full()).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::UpstreamError));
    assert_eq!(result.chunks_failed(), 1);
}
