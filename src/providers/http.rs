//! Shared HTTP plumbing for vendor clients.
//!
//! One [`VendorHttp`] wraps a configured `reqwest::Client` for a single
//! provider. It performs exactly one exchange per call, never retries, and
//! converts transport failures into [`CdnError`] values.

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::debug;

use crate::config::HttpSettings;
use crate::domain::ProviderKind;
use crate::errors::{CdnError, Result};
use crate::observability::MetricsRecorder;

/// Raw vendor answer for one exchange
#[derive(Debug, Clone)]
pub struct VendorResponse {
    pub status: StatusCode,
    pub body: String,
    /// `Retry-After` in seconds, when the vendor sent one
    pub retry_after: Option<u64>,
}

impl VendorResponse {
    /// Decode the body as JSON, reporting undecodable payloads as upstream errors
    pub fn json<T: DeserializeOwned>(&self, provider: ProviderKind) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            CdnError::upstream(
                provider,
                self.status.as_u16(),
                format!("Unexpected response from {}: {}", provider, e),
            )
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Configured HTTP client bound to one vendor base URL
#[derive(Debug, Clone)]
pub struct VendorHttp {
    provider: ProviderKind,
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl VendorHttp {
    /// Build a client with the fixed timeout and the given default headers.
    ///
    /// Fails only on programmer errors (unparseable base URL, TLS backend
    /// initialisation), which surface as [`CdnError::Internal`].
    pub fn new(
        provider: ProviderKind,
        base_url: &str,
        settings: &HttpSettings,
        default_headers: HeaderMap,
    ) -> Result<Self> {
        url::Url::parse(base_url).map_err(|e| {
            CdnError::internal(format!("Invalid {} endpoint '{}': {}", provider, base_url, e))
        })?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .connect_timeout(settings.connect_timeout())
            .user_agent(settings.user_agent.clone())
            .default_headers(default_headers)
            .build()
            .map_err(|e| CdnError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: settings.timeout().as_millis() as u64,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API-relative path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(provider = %self.provider, %method, %url, "building vendor request");
        self.client.request(method, url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// Execute one exchange and return the status and body.
    ///
    /// Non-2xx statuses are returned as values; vendor clients decide how to
    /// map them because each vendor reports errors differently.
    pub async fn send(&self, operation: &str, request: RequestBuilder) -> Result<VendorResponse> {
        let started = Instant::now();
        let response = request.send().await.map_err(|e| self.transport_error(operation, e))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
        let body = response.text().await.map_err(|e| self.transport_error(operation, e))?;

        let elapsed = started.elapsed().as_secs_f64();
        MetricsRecorder::new().record_vendor_request(
            self.provider,
            operation,
            status.as_u16(),
            elapsed,
        );
        debug!(
            provider = %self.provider,
            operation,
            status = status.as_u16(),
            elapsed_ms = (elapsed * 1000.0) as u64,
            "vendor exchange completed"
        );

        Ok(VendorResponse { status, body, retry_after })
    }

    fn transport_error(&self, operation: &str, error: reqwest::Error) -> CdnError {
        if error.is_timeout() {
            return CdnError::timeout(format!("{} {}", self.provider, operation), self.timeout_ms);
        }
        MetricsRecorder::new().record_vendor_request(self.provider, operation, 0, 0.0);
        CdnError::upstream(
            self.provider,
            error.status().map(|s| s.as_u16()).unwrap_or(0),
            format!("{} request failed: {}", self.provider, error),
        )
    }
}

/// Map a failed vendor status into the shared taxonomy.
///
/// 401/403 mean rejected credentials, 429 means throttling, everything else
/// is an upstream error carrying the vendor message verbatim.
pub fn status_error(
    provider: ProviderKind,
    response: &VendorResponse,
    message: String,
) -> CdnError {
    match response.status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CdnError::auth(provider, message),
        StatusCode::TOO_MANY_REQUESTS => {
            CdnError::rate_limited(provider, message).with_retry_after(response.retry_after)
        }
        status => CdnError::upstream(provider, status.as_u16(), message),
    }
}

/// Fallback message when a vendor error body carries no text
pub fn default_message(provider: ProviderKind, response: &VendorResponse) -> String {
    let body = response.body.trim();
    if body.is_empty() {
        format!("{} returned HTTP {}", provider, response.status.as_u16())
    } else {
        body.chars().take(512).collect()
    }
}

fn parse_retry_after(value: Option<&HeaderValue>) -> Option<u64> {
    value.and_then(|v| v.to_str().ok()).and_then(|v| v.trim().parse::<u64>().ok())
}

/// Read a counter that vendors encode as either a JSON number or a string
pub fn json_u64(value: Option<&serde_json::Value>) -> Option<u64> {
    match value? {
        serde_json::Value::Number(n) => {
            n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        serde_json::Value::String(s) => {
            s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64)
        }
        _ => None,
    }
}

/// Read an id that vendors encode as either a JSON number or a string
pub fn json_id(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
