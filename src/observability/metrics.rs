//! # Metrics Collection
//!
//! Counters and histograms recorded through the `metrics` facade. The library
//! never installs an exporter; without one every call is a no-op.

use crate::domain::{ProviderKind, PurgeResult};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::sync::Once;

pub const PURGE_REQUESTS_TOTAL: &str = "cdn_purge_requests_total";
pub const PURGE_CHUNKS_TOTAL: &str = "cdn_purge_chunks_total";
pub const VENDOR_REQUESTS_TOTAL: &str = "cdn_vendor_requests_total";
pub const PURGE_DURATION_SECONDS: &str = "cdn_purge_duration_seconds";
pub const VENDOR_REQUEST_DURATION_SECONDS: &str = "cdn_vendor_request_duration_seconds";

/// Outcome label for a single chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Success,
    Failure,
    Retry,
}

impl ChunkOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Retry => "retry",
        }
    }
}

/// Metrics recorder for purge and vendor activity
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record one vendor HTTP exchange. Status 0 means no response arrived.
    pub fn record_vendor_request(
        &self,
        provider: ProviderKind,
        operation: &str,
        status: u16,
        duration: f64,
    ) {
        let labels = [("provider", provider.to_string()), ("status", status.to_string())];
        counter!(VENDOR_REQUESTS_TOTAL, &labels).increment(1);

        let duration_labels =
            [("provider", provider.to_string()), ("operation", operation.to_string())];
        histogram!(VENDOR_REQUEST_DURATION_SECONDS, &duration_labels).record(duration);
    }

    /// Record the start of a purge run
    pub fn record_purge(&self, provider: ProviderKind, scope: &str) {
        let labels = [("provider", provider.to_string()), ("scope", scope.to_string())];
        counter!(PURGE_REQUESTS_TOTAL, &labels).increment(1);
    }

    pub fn record_chunk(&self, provider: ProviderKind, outcome: ChunkOutcome) {
        let labels =
            [("provider", provider.to_string()), ("outcome", outcome.as_str().to_string())];
        counter!(PURGE_CHUNKS_TOTAL, &labels).increment(1);
    }

    /// Record the end of a purge run
    pub fn record_purge_result(&self, result: &PurgeResult) {
        let labels = [("provider", result.provider().to_string())];
        histogram!(PURGE_DURATION_SECONDS, &labels).record(result.duration_ms() as f64 / 1000.0);
    }
}

/// Register metric descriptions with whatever recorder the host installed.
///
/// Only the first call has an effect.
pub fn describe_metrics() {
    static DESCRIBED: Once = Once::new();
    DESCRIBED.call_once(|| {
        describe_counter!(PURGE_REQUESTS_TOTAL, Unit::Count, "Purge runs grouped by scope");
        describe_counter!(PURGE_CHUNKS_TOTAL, Unit::Count, "Purge chunks grouped by outcome");
        describe_counter!(
            VENDOR_REQUESTS_TOTAL,
            Unit::Count,
            "Vendor API exchanges grouped by HTTP status"
        );
        describe_histogram!(
            PURGE_DURATION_SECONDS,
            Unit::Seconds,
            "Wall-clock duration of purge runs"
        );
        describe_histogram!(
            VENDOR_REQUEST_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of individual vendor API exchanges"
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        describe_metrics();
        describe_metrics();
        let recorder = MetricsRecorder::new();
        recorder.record_vendor_request(ProviderKind::Cloudflare, "purge_batch", 200, 0.12);
        recorder.record_purge(ProviderKind::Cloudflare, "urls");
        recorder.record_chunk(ProviderKind::Cloudflare, ChunkOutcome::Success);
        recorder.record_purge_result(&PurgeResult::completed(ProviderKind::Cloudflare, 1));
    }

    #[test]
    fn test_chunk_outcome_labels() {
        assert_eq!(ChunkOutcome::Success.as_str(), "success");
        assert_eq!(ChunkOutcome::Failure.as_str(), "failure");
        assert_eq!(ChunkOutcome::Retry.as_str(), "retry");
    }
}
