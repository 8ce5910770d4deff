//! Zone / distribution descriptors returned by vendors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Active,
    /// Vendor status string for anything that is not serving traffic
    Other(String),
}

impl ZoneStatus {
    /// Map a vendor status string; each vendor spells "live" differently.
    pub fn from_vendor(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "active" | "deployed" | "enabled" | "true" => ZoneStatus::Active,
            other => ZoneStatus::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ZoneStatus::Active)
    }
}

/// A vendor zone, fetched fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub id: String,
    /// Domain (or origin host) the zone serves
    pub name: String,
    pub status: ZoneStatus,
    /// Provider-specific attributes (plan, hostnames, aliases, ...)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl ZoneInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: ZoneStatus) -> Self {
        Self { id: id.into(), name: name.into(), status, extra: BTreeMap::new() }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Add config-level annotations without overriding vendor attributes
    pub fn annotated(mut self, annotations: &BTreeMap<String, String>) -> Self {
        for (key, value) in annotations {
            self.extra.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self
    }
}

/// Reduce `https://www.Example.com/path` style input to `example.com`.
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim().to_ascii_lowercase();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(&trimmed);
    let host = without_scheme.split(['/', '?', '#']).next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    let host = host.trim_end_matches('.');
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://www.Example.com/blog?x=1"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("http://shop.example.com:8080/"), "shop.example.com");
        assert_eq!(normalize_domain("  "), "");
    }

    #[test]
    fn test_annotations_keep_vendor_attributes() {
        let annotations = BTreeMap::from([
            ("plan".to_string(), "from-config".to_string()),
            ("cache_level".to_string(), "aggressive".to_string()),
        ]);
        let zone = ZoneInfo::new("1", "example.com", ZoneStatus::Active)
            .with_extra("plan", "Free")
            .annotated(&annotations);
        assert_eq!(zone.extra["plan"], "Free");
        assert_eq!(zone.extra["cache_level"], "aggressive");
    }

    #[test]
    fn test_zone_status_from_vendor() {
        assert!(ZoneStatus::from_vendor("active").is_active());
        assert!(ZoneStatus::from_vendor("Deployed").is_active());
        assert_eq!(ZoneStatus::from_vendor("pending"), ZoneStatus::Other("pending".into()));
    }
}
