//! Purge requests and their unified outcome.

use serde::{Deserialize, Serialize};
use url::Url;

use super::ProviderKind;
use crate::errors::{CdnError, ErrorKind, Result};

/// What to evict from the CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "urls", rename_all = "snake_case")]
pub enum PurgeScope {
    /// Evict everything cached for the zone
    Full,
    /// Evict the listed absolute URLs, in order
    Urls(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeRequest {
    pub scope: PurgeScope,
}

impl PurgeRequest {
    pub fn full() -> Self {
        Self { scope: PurgeScope::Full }
    }

    pub fn urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { scope: PurgeScope::Urls(urls.into_iter().map(Into::into).collect()) }
    }

    /// Reject empty URL lists and anything that is not an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        match &self.scope {
            PurgeScope::Full => Ok(()),
            PurgeScope::Urls(urls) => validate_urls(urls),
        }
    }

    pub fn scope_label(&self) -> &'static str {
        match self.scope {
            PurgeScope::Full => "full",
            PurgeScope::Urls(_) => "urls",
        }
    }
}

/// Shared URL-list validation used by the orchestrator and every client.
pub fn validate_urls(urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        return Err(CdnError::invalid_input("URL purge requires at least one URL"));
    }
    for raw in urls {
        let parsed = Url::parse(raw.trim())
            .map_err(|e| CdnError::invalid_input(format!("Malformed URL '{}': {}", raw, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(CdnError::invalid_input(format!(
                "URL '{}' must be an absolute http(s) URL",
                raw
            )));
        }
    }
    Ok(())
}

/// Error attached to a failed purge; the message is the vendor text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CdnError> for PurgeFailure {
    fn from(error: &CdnError) -> Self {
        Self { kind: error.kind(), message: error.message() }
    }
}

/// Unified purge outcome.
///
/// Fields are private so `success` can only be true when at least one chunk
/// was attempted and none failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurgeResult {
    success: bool,
    provider: ProviderKind,
    chunks_attempted: u32,
    chunks_failed: u32,
    error: Option<PurgeFailure>,
    cancelled: bool,
    duration_ms: u64,
}

impl PurgeResult {
    /// Every attempted chunk succeeded.
    pub fn completed(provider: ProviderKind, chunks_attempted: u32) -> Self {
        Self {
            success: chunks_attempted > 0,
            provider,
            chunks_attempted,
            chunks_failed: 0,
            error: None,
            cancelled: false,
            duration_ms: 0,
        }
    }

    /// Validation (credentials or request) failed before any chunk was sent.
    pub fn rejected(provider: ProviderKind, error: &CdnError) -> Self {
        Self {
            success: false,
            provider,
            chunks_attempted: 0,
            chunks_failed: 0,
            error: Some(error.into()),
            cancelled: false,
            duration_ms: 0,
        }
    }

    /// The chunk at position `chunks_attempted` failed and the run stopped.
    pub fn failed(provider: ProviderKind, chunks_attempted: u32, error: &CdnError) -> Self {
        Self {
            success: false,
            provider,
            chunks_attempted,
            chunks_failed: 1,
            error: Some(error.into()),
            cancelled: false,
            duration_ms: 0,
        }
    }

    /// The host cancelled the run between chunks.
    pub fn cancelled(provider: ProviderKind, chunks_attempted: u32) -> Self {
        Self { cancelled: true, ..Self::completed(provider, chunks_attempted) }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn chunks_attempted(&self) -> u32 {
        self.chunks_attempted
    }

    pub fn chunks_failed(&self) -> u32 {
        self.chunks_failed
    }

    pub fn error(&self) -> Option<&PurgeFailure> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}
