//! CloudFront invalidations and distribution listing against a mock API.

mod common;

use std::time::Duration;

use cachegate::config::{HttpSettings, RetryConfig};
use cachegate::domain::keys;
use cachegate::{
    ErrorKind, ProviderConfig, ProviderKind, PurgeOrchestrator, PurgeRequest, ZoneResolver,
};
use common::*;
use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INVALIDATION_PATH: &str = "/2020-05-31/distribution/E2QWRUHEXAMPLE/invalidation";
const LIST_PATH: &str = "/2020-05-31/distribution";

const CREATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Invalidation xmlns="http://cloudfront.amazonaws.com/doc/2020-05-31/">
  <Id>I2J0I21PCUYOIK</Id>
  <Status>InProgress</Status>
  <CreateTime>2024-05-01T12:00:00.000Z</CreateTime>
  <InvalidationBatch>
    <Paths><Quantity>1</Quantity><Items><Path>/*</Path></Items></Paths>
    <CallerReference>cachegate-ref</CallerReference>
  </InvalidationBatch>
</Invalidation>"#;

fn created() -> ResponseTemplate {
    ResponseTemplate::new(201)
        .insert_header("content-type", "text/xml")
        .insert_header(
            "location",
            format!("https://cloudfront.amazonaws.com{}/I2J0I21PCUYOIK", INVALIDATION_PATH),
        )
        .set_body_string(CREATED)
}

fn error_response(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("content-type", "text/xml").set_body_string(
        format!(
            "<?xml version=\"1.0\"?><ErrorResponse \
             xmlns=\"http://cloudfront.amazonaws.com/doc/2020-05-31/\"><Error>\
             <Type>Sender</Type><Code>{}</Code><Message>{}</Message></Error>\
             <RequestId>b2b4a2b0-0000-0000-0000-000000000000</RequestId></ErrorResponse>",
            code, message
        ),
    )
}

fn summary(id: &str, status: &str, domain: &str, aliases: &[&str]) -> String {
    let alias_items: String =
        aliases.iter().map(|a| format!("<CNAME>{}</CNAME>", a)).collect();
    format!(
        r#"<DistributionSummary>
      <Id>{id}</Id>
      <ARN>arn:aws:cloudfront::123456789012:distribution/{id}</ARN>
      <Status>{status}</Status>
      <LastModifiedTime>2024-05-01T12:00:00.000Z</LastModifiedTime>
      <DomainName>{domain}</DomainName>
      <Aliases><Quantity>{count}</Quantity><Items>{alias_items}</Items></Aliases>
      <Origins><Quantity>1</Quantity><Items><Origin>
        <Id>origin-1</Id><DomainName>origin.example.com</DomainName><OriginPath></OriginPath>
      </Origin></Items></Origins>
      <Comment></Comment>
      <PriceClass>PriceClass_All</PriceClass>
      <Enabled>true</Enabled>
      <HttpVersion>http2</HttpVersion>
      <IsIPV6Enabled>true</IsIPV6Enabled>
      <Staging>false</Staging>
    </DistributionSummary>"#,
        count = aliases.len(),
    )
}

fn distribution_list(summaries: &[String], next_marker: Option<&str>) -> ResponseTemplate {
    let truncated = next_marker.is_some();
    let next = next_marker.map(|m| format!("<NextMarker>{}</NextMarker>", m)).unwrap_or_default();
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<DistributionList xmlns="http://cloudfront.amazonaws.com/doc/2020-05-31/">
  <Marker></Marker>{next}
  <MaxItems>100</MaxItems>
  <IsTruncated>{truncated}</IsTruncated>
  <Quantity>{quantity}</Quantity>
  <Items>{items}</Items>
</DistributionList>"#,
        quantity = summaries.len(),
        items = summaries.concat(),
    );
    ResponseTemplate::new(200).insert_header("content-type", "text/xml").set_body_string(body)
}

#[tokio::test]
async fn test_full_purge_invalidates_everything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INVALIDATION_PATH))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(body_string_contains("<Path>/*</Path>"))
        .and(body_string_contains("<Quantity>1</Quantity>"))
        .and(body_string_contains("<CallerReference>cachegate-"))
        .respond_with(created())
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator().purge(&cloudfront_config(&server), &PurgeRequest::full()).await;
    assert!(result.success(), "{:?}", result);
    assert_eq!(result.chunks_attempted(), 1);
}

#[tokio::test]
async fn test_signature_covers_key_and_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INVALIDATION_PATH))
        .and(header_exists("x-amz-security-token"))
        .respond_with(created())
        .expect(1)
        .mount(&server)
        .await;

    let config = cloudfront_config(&server).with_credential(keys::SESSION_TOKEN, "session");
    let result = orchestrator().purge(&config, &PurgeRequest::full()).await;
    assert!(result.success(), "{:?}", result);

    let requests = server.received_requests().await.unwrap_or_default();
    let authorization = requests[0]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
    assert!(authorization.contains("/us-east-1/cloudfront/aws4_request"));
    assert!(!authorization.contains("wJalrXUtnFEMI"));
}

#[tokio::test]
async fn test_url_paths_in_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INVALIDATION_PATH))
        .and(body_string_contains("<Path>/css/site.css</Path>"))
        .and(body_string_contains("<Path>/search?q=a&amp;b=1</Path>"))
        .and(body_string_contains("<Quantity>2</Quantity>"))
        .respond_with(created())
        .expect(1)
        .mount(&server)
        .await;

    let request = PurgeRequest::urls([
        "https://example.com/css/site.css",
        "https://example.com/search?q=a&b=1",
    ]);
    let result = orchestrator().purge(&cloudfront_config(&server), &request).await;
    assert!(result.success(), "{:?}", result);
}

#[tokio::test]
async fn test_throttling_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INVALIDATION_PATH))
        .respond_with(error_response(
            400,
            "TooManyInvalidationsInProgress",
            "Processing your request will cause you to exceed the maximum number of \
             in-progress wildcard invalidations.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator().purge(&cloudfront_config(&server), &PurgeRequest::full()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::RateLimited));
    assert_eq!(result.chunks_failed(), 1);
}

#[tokio::test]
async fn test_signature_mismatch_maps_to_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(error_response(
            403,
            "SignatureDoesNotMatch",
            "The request signature we calculated does not match",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator().purge(&cloudfront_config(&server), &PurgeRequest::full()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::AuthError));
    assert_eq!(
        result.error().unwrap().message,
        "The request signature we calculated does not match"
    );
}

#[tokio::test]
async fn test_unknown_distribution_is_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INVALIDATION_PATH))
        .respond_with(error_response(
            404,
            "NoSuchDistribution",
            "The specified distribution does not exist.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator().purge(&cloudfront_config(&server), &PurgeRequest::full()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::UpstreamError));
    assert_eq!(result.error().unwrap().message, "The specified distribution does not exist.");
}

#[tokio::test]
async fn test_slow_invalidation_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INVALIDATION_PATH))
        .respond_with(created().set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = PurgeOrchestrator::new(
        HttpSettings { timeout_seconds: 1, connect_timeout_seconds: 1, ..Default::default() },
        RetryConfig::default(),
    );
    let result = orchestrator.purge(&cloudfront_config(&server), &PurgeRequest::full()).await;
    assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(result.chunks_failed(), 1);
}

#[tokio::test]
async fn test_distributions_listed_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("Marker", "EDFDVBD6EXAMPLE"))
        .respond_with(distribution_list(
            &[summary("E1OTHER", "InProgress", "d222.cloudfront.net", &[])],
            None,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(distribution_list(
            &[summary(
                "EDFDVBD6EXAMPLE",
                "Deployed",
                "d111111abcdef8.cloudfront.net",
                &["www.example.com", "static.example.com"],
            )],
            Some("EDFDVBD6EXAMPLE"),
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let zones = ZoneResolver::new(test_http())
        .list_zones(&cloudfront_config(&server))
        .await
        .unwrap();

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].id, "EDFDVBD6EXAMPLE");
    assert_eq!(zones[0].name, "www.example.com");
    assert!(zones[0].status.is_active());
    assert_eq!(zones[0].extra["domain_name"], "d111111abcdef8.cloudfront.net");
    assert_eq!(zones[0].extra["aliases"], "www.example.com,static.example.com");
    assert_eq!(zones[1].name, "d222.cloudfront.net");
    assert!(!zones[1].status.is_active());
}

#[tokio::test]
async fn test_distribution_detected_by_alias() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(distribution_list(
            &[
                summary("E1OTHER", "Deployed", "d222.net", &["example.com.attacker.net"]),
                summary("EDFDVBD6EXAMPLE", "Deployed", "d111.net", &["cdn.example.com"]),
            ],
            None,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(ProviderKind::CloudFront)
        .with_credential(keys::ACCESS_KEY, "AKIDEXAMPLE")
        .with_credential(keys::SECRET_KEY, "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
        .with_endpoint(server.uri());

    let zone_id = ZoneResolver::new(test_http()).resolve(&config, "example.com").await.unwrap();
    assert_eq!(zone_id, "EDFDVBD6EXAMPLE");
}
