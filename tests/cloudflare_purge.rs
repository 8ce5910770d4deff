//! Cloudflare purge behaviour against a mock API.

mod common;

use cachegate::domain::keys;
use cachegate::{ErrorKind, ProviderConfig, ProviderKind, PurgeRequest};
use common::*;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn purge_path() -> String {
    format!("/zones/{}/purge_cache", CF_ZONE)
}

#[tokio::test]
async fn test_rate_limit_on_first_chunk_stops_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(cf_error(971, "Please wait and try again")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator()
        .purge(&cloudflare_config(&server), &PurgeRequest::urls(urls(90)))
        .await;

    assert!(!result.success());
    assert_eq!(result.chunks_attempted(), 1);
    assert_eq!(result.chunks_failed(), 1);
    assert_eq!(result.error_kind(), Some(ErrorKind::RateLimited));
    assert_eq!(result.error().unwrap().message, "Please wait and try again");
}

#[tokio::test]
async fn test_url_chunks_sent_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .and(header("authorization", "Bearer cf-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!({"id": CF_ZONE}))))
        .expect(3)
        .mount(&server)
        .await;

    let input = urls(65);
    let result = orchestrator()
        .purge(&cloudflare_config(&server), &PurgeRequest::urls(input.clone()))
        .await;

    assert!(result.success());
    assert_eq!(result.chunks_attempted(), 3);
    assert_eq!(result.chunks_failed(), 0);

    let requests = server.received_requests().await.unwrap();
    let sent: Vec<String> = requests
        .iter()
        .flat_map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["files"]
                .as_array()
                .unwrap()
                .iter()
                .map(|u| u.as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(sent, input);
}

#[tokio::test]
async fn test_full_purge_is_repeatable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .and(body_json(json!({"purge_everything": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!({"id": CF_ZONE}))))
        .expect(2)
        .mount(&server)
        .await;

    let config = cloudflare_config(&server);
    let orchestrator = orchestrator();
    for _ in 0..2 {
        let result = orchestrator.purge(&config, &PurgeRequest::full()).await;
        assert!(result.success());
        assert_eq!(result.chunks_attempted(), 1);
    }
}

#[tokio::test]
async fn test_legacy_global_key_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .and(header("x-auth-email", "ops@example.com"))
        .and(header("x-auth-key", "global-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(ProviderKind::Cloudflare)
        .with_credential(keys::EMAIL, "ops@example.com")
        .with_credential(keys::API_KEY, "global-key")
        .with_credential(keys::ZONE_ID, CF_ZONE)
        .with_endpoint(server.uri());
    let result = orchestrator().purge(&config, &PurgeRequest::full()).await;
    assert!(result.success());
}

#[tokio::test]
async fn test_missing_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(ProviderKind::Cloudflare)
        .with_credential(keys::ZONE_ID, CF_ZONE)
        .with_endpoint(server.uri());
    let result = orchestrator().purge(&config, &PurgeRequest::urls(urls(3))).await;

    assert!(!result.success());
    assert_eq!(result.chunks_attempted(), 0);
    assert_eq!(result.error_kind(), Some(ErrorKind::MissingCredentials));
}

#[tokio::test]
async fn test_empty_url_list_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = orchestrator()
        .purge(&cloudflare_config(&server), &PurgeRequest::urls(Vec::<String>::new()))
        .await;
    assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));
    assert_eq!(result.chunks_attempted(), 0);
}

#[tokio::test]
async fn test_auth_error_code_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(cf_error(10000, "Authentication error")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator().purge(&cloudflare_config(&server), &PurgeRequest::full()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::AuthError));
    assert_eq!(result.error().unwrap().message, "Authentication error");
}

#[tokio::test]
async fn test_rate_limit_retried_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .respond_with(ResponseTemplate::new(429).set_body_json(cf_error(971, "Please wait")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!({}))))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator_with_retries(2)
        .purge(&cloudflare_config(&server), &PurgeRequest::urls(urls(10)))
        .await;
    assert!(result.success());
    assert_eq!(result.chunks_attempted(), 1);
}

#[tokio::test]
async fn test_zone_name_resolved_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [
                {"id": "other", "name": "other.org", "status": "active"},
                {"id": CF_ZONE, "name": "example.com", "status": "active"}
            ],
            "result_info": {"page": 1, "total_pages": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(purge_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!({}))))
        .expect(2)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(ProviderKind::Cloudflare)
        .with_credential(keys::API_TOKEN, "cf-token")
        .with_credential(keys::ZONE_NAME, "example.com")
        .with_endpoint(server.uri());
    let result = orchestrator().purge(&config, &PurgeRequest::urls(urls(31))).await;
    assert!(result.success());
    assert_eq!(result.chunks_attempted(), 2);
}
