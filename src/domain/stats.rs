//! Normalized CDN analytics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CdnError, Result};

/// Reporting window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatsWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(CdnError::invalid_input(format!(
                "Stats window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Window ending now and spanning `days` days
    pub fn last_days(days: u32) -> Result<Self> {
        let end = Utc::now();
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                CdnError::invalid_input(format!("Stats window of {} days is out of range", days))
            })?;
        Ok(Self { start, end })
    }
}

/// Vendor-side figures before normalization. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    pub requests_total: Option<u64>,
    pub cached_requests: Option<u64>,
    pub bandwidth_total_bytes: Option<u64>,
    pub threats_blocked: Option<u64>,
    /// Ratio the vendor already computed, in percent
    pub hit_ratio_percent: Option<f64>,
}

/// Common analytics shape across vendors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub bandwidth_total_bytes: u64,
    pub cache_hit_ratio_percent: f64,
    pub threats_blocked: u64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl StatsSnapshot {
    /// All-zero snapshot for providers without analytics
    pub fn empty(window: &StatsWindow) -> Self {
        Self {
            requests_total: 0,
            bandwidth_total_bytes: 0,
            cache_hit_ratio_percent: 0.0,
            threats_blocked: 0,
            window_start: window.start,
            window_end: window.end,
        }
    }

    /// Normalize vendor figures: missing numbers become 0 and the hit ratio
    /// is derived from raw counts when the vendor did not compute one.
    pub fn from_raw(raw: &RawStats, window: &StatsWindow) -> Self {
        let requests_total = raw.requests_total.unwrap_or(0);
        let cache_hit_ratio_percent = match (raw.hit_ratio_percent, raw.cached_requests) {
            (Some(ratio), _) => clamp_ratio(ratio),
            (None, Some(cached)) => hit_ratio(cached, requests_total),
            (None, None) => 0.0,
        };

        Self {
            requests_total,
            bandwidth_total_bytes: raw.bandwidth_total_bytes.unwrap_or(0),
            cache_hit_ratio_percent,
            threats_blocked: raw.threats_blocked.unwrap_or(0),
            window_start: window.start,
            window_end: window.end,
        }
    }
}

/// `cached / total * 100` rounded to 2 decimals; 0 when `total` is 0.
pub fn hit_ratio(cached: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_ratio(cached as f64 / total as f64 * 100.0)
}

fn clamp_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() {
        return 0.0;
    }
    round2(ratio.clamp(0.0, 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
