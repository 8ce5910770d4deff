//! Environment variable credential store.
//!
//! ```bash
//! export CACHEGATE_PROVIDER=cloudflare
//! export CACHEGATE_CLOUDFLARE_API_TOKEN="..."
//! export CACHEGATE_CLOUDFLARE_ZONE_ID="..."
//! export CACHEGATE_CLOUDFLARE_ENDPOINT="http://localhost:9000/"   # optional
//! export CACHEGATE_CLOUDFLARE_FLAGS="purge_on_publish,cdn_urls"   # optional
//! ```
//!
//! Values are read at call time, never cached.

use async_trait::async_trait;
use std::env;
use tracing::debug;

use super::CredentialStore;
use crate::config::ENV_PREFIX;
use crate::domain::{keys, ProviderConfig, ProviderKind};
use crate::errors::Result;

/// Credential keys looked up for every provider
const KNOWN_KEYS: &[&str] = &[
    keys::API_TOKEN,
    keys::API_KEY,
    keys::EMAIL,
    keys::ZONE_ID,
    keys::ZONE_NAME,
    keys::SITE_URL,
    keys::ACCESS_KEY,
    keys::SECRET_KEY,
    keys::SESSION_TOKEN,
    keys::DISTRIBUTION_ID,
    keys::REGION,
    keys::CUSTOM_HOSTNAME,
    keys::CACHE_LEVEL,
];

#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvCredentialStore {
    /// Store reading `CACHEGATE_*` variables
    pub fn new() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into().trim_end_matches('_').to_ascii_uppercase() }
    }

    /// Variable name for one provider setting, e.g. `CACHEGATE_KEYCDN_API_KEY`
    pub fn var_name(&self, kind: ProviderKind, key: &str) -> String {
        let provider = kind.as_str().to_ascii_uppercase();
        format!("{}_{}_{}", self.prefix, provider, key.to_ascii_uppercase())
    }

    fn read(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn active_kind(&self) -> Result<ProviderKind> {
        match Self::read(&format!("{}_PROVIDER", self.prefix)) {
            Some(value) => value.parse(),
            None => Ok(ProviderKind::None),
        }
    }

    async fn load(&self, kind: ProviderKind) -> Result<ProviderConfig> {
        let mut config = ProviderConfig::new(kind);
        if kind == ProviderKind::None {
            return Ok(config);
        }

        for key in KNOWN_KEYS {
            if let Some(value) = Self::read(&self.var_name(kind, key)) {
                config = config.with_credential(*key, value);
            }
        }
        if let Some(endpoint) = Self::read(&self.var_name(kind, "endpoint")) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(flags) = Self::read(&self.var_name(kind, "flags")) {
            for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                config = config.with_flag(flag);
            }
        }

        debug!(
            provider = %kind,
            keys = ?config.credential_keys().collect::<Vec<_>>(),
            "loaded provider configuration from environment"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CdnError;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_var_name() {
        let store = EnvCredentialStore::new();
        assert_eq!(store.var_name(ProviderKind::KeyCdn, "api_key"), "CACHEGATE_KEYCDN_API_KEY");
        let custom = EnvCredentialStore::with_prefix("site1_");
        assert_eq!(custom.var_name(ProviderKind::CloudFront, "region"), "SITE1_CLOUDFRONT_REGION");
    }

    #[tokio::test]
    async fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let store = EnvCredentialStore::with_prefix("CGTEST_LOAD");
        env::set_var("CGTEST_LOAD_PROVIDER", "bunnycdn");
        env::set_var("CGTEST_LOAD_BUNNYCDN_API_KEY", "bunny-key");
        env::set_var("CGTEST_LOAD_BUNNYCDN_ZONE_NAME", "mysite");
        env::set_var("CGTEST_LOAD_BUNNYCDN_ZONE_ID", "   ");
        env::set_var("CGTEST_LOAD_BUNNYCDN_FLAGS", "a, b,");

        let config = store.load_active().await.unwrap();
        assert_eq!(config.kind, ProviderKind::BunnyCdn);
        assert_eq!(config.credential(keys::API_KEY), Some("bunny-key"));
        assert_eq!(config.credential(keys::ZONE_NAME), Some("mysite"));
        assert_eq!(config.credential(keys::ZONE_ID), None);
        assert_eq!(config.flags().collect::<Vec<_>>(), ["a", "b"]);

        for name in ["PROVIDER", "BUNNYCDN_API_KEY", "BUNNYCDN_ZONE_NAME", "BUNNYCDN_ZONE_ID"] {
            env::remove_var(format!("CGTEST_LOAD_{}", name));
        }
        env::remove_var("CGTEST_LOAD_BUNNYCDN_FLAGS");
    }

    #[tokio::test]
    async fn test_active_kind_defaults_to_none_and_rejects_unknown() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let store = EnvCredentialStore::with_prefix("CGTEST_KIND");
        env::remove_var("CGTEST_KIND_PROVIDER");
        assert_eq!(store.active_kind().await.unwrap(), ProviderKind::None);

        env::set_var("CGTEST_KIND_PROVIDER", "akamai");
        assert!(matches!(store.active_kind().await, Err(CdnError::InvalidInput { .. })));
        env::remove_var("CGTEST_KIND_PROVIDER");
    }
}
