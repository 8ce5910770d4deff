//! Provider identity and configuration snapshots.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::errors::{CdnError, Result};

/// The closed set of supported CDN vendors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// No CDN configured; every operation is a local no-op
    #[default]
    None,
    Cloudflare,
    #[serde(rename = "keycdn")]
    KeyCdn,
    #[serde(rename = "bunnycdn")]
    BunnyCdn,
    #[serde(rename = "cloudfront")]
    CloudFront,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::None,
        ProviderKind::Cloudflare,
        ProviderKind::KeyCdn,
        ProviderKind::BunnyCdn,
        ProviderKind::CloudFront,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cloudflare => "cloudflare",
            Self::KeyCdn => "keycdn",
            Self::BunnyCdn => "bunnycdn",
            Self::CloudFront => "cloudfront",
        }
    }

    /// Credential key holding the explicit zone/distribution identifier.
    pub fn zone_key(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Cloudflare | Self::KeyCdn | Self::BunnyCdn => Some(keys::ZONE_ID),
            Self::CloudFront => Some(keys::DISTRIBUTION_ID),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = CdnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "local" => Ok(Self::None),
            "cloudflare" => Ok(Self::Cloudflare),
            "keycdn" => Ok(Self::KeyCdn),
            "bunnycdn" | "bunny" => Ok(Self::BunnyCdn),
            "cloudfront" => Ok(Self::CloudFront),
            other => Err(CdnError::invalid_input(format!("Unknown CDN provider: {}", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognized credential keys.
pub mod keys {
    pub const API_TOKEN: &str = "api_token";
    pub const API_KEY: &str = "api_key";
    pub const EMAIL: &str = "email";
    pub const ZONE_ID: &str = "zone_id";
    pub const ZONE_NAME: &str = "zone_name";
    pub const SITE_URL: &str = "site_url";
    pub const ACCESS_KEY: &str = "access_key";
    pub const SECRET_KEY: &str = "secret_key";
    pub const SESSION_TOKEN: &str = "session_token";
    pub const DISTRIBUTION_ID: &str = "distribution_id";
    pub const REGION: &str = "region";
    pub const CUSTOM_HOSTNAME: &str = "custom_hostname";
    pub const CACHE_LEVEL: &str = "cache_level";
}

/// Immutable configuration snapshot for one provider.
///
/// The settings layer builds a fresh snapshot on every read; builder methods
/// consume `self` and hand back a new value instead of mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(default)]
    credentials: BTreeMap<String, String>,
    #[serde(default)]
    flags: BTreeSet<String>,
    /// Base URL override (self-hosted API proxies, mock vendors)
    #[serde(default)]
    endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind, credentials: BTreeMap::new(), flags: BTreeSet::new(), endpoint: None }
    }

    /// Snapshot for the "no CDN" provider
    pub fn none() -> Self {
        Self::new(ProviderKind::None)
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn with_credentials<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.credentials.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Credential value, treating blank strings as absent
    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Credential value or a `MissingCredentials` error naming the field
    pub fn require(&self, key: &str) -> Result<&str> {
        self.credential(key).ok_or_else(|| CdnError::missing_credentials(self.kind, key))
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    /// Informational settings reported on every zone listed with this
    /// snapshot: `custom_hostname`, `cache_level` and the joined flags.
    pub fn zone_annotations(&self) -> BTreeMap<String, String> {
        let mut annotations: BTreeMap<String, String> = [keys::CUSTOM_HOSTNAME, keys::CACHE_LEVEL]
            .into_iter()
            .filter_map(|key| self.credential(key).map(|v| (key.to_string(), v.to_string())))
            .collect();
        if !self.flags.is_empty() {
            annotations.insert("flags".to_string(), self.flags().collect::<Vec<_>>().join(","));
        }
        annotations
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Explicitly configured zone/distribution id, if any
    pub fn explicit_zone_id(&self) -> Option<&str> {
        self.kind.zone_key().and_then(|key| self.credential(key))
    }

    /// Credential keys present in this snapshot (values are never exposed)
    pub fn credential_keys(&self) -> impl Iterator<Item = &str> {
        self.credentials.keys().map(String::as_str)
    }
}
