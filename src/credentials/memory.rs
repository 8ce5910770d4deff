//! In-memory credential store for hosts that already hold configuration
//! and for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::CredentialStore;
use crate::domain::{ProviderConfig, ProviderKind};
use crate::errors::{CdnError, Result};

#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    active: RwLock<ProviderKind>,
    configs: RwLock<HashMap<ProviderKind, ProviderConfig>>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a single config that is also the active one
    pub fn single(config: ProviderConfig) -> Self {
        let store = Self::new();
        store.set_active(config.kind);
        store.insert(config);
        store
    }

    /// Replace the snapshot for `config.kind`
    pub fn insert(&self, config: ProviderConfig) {
        let mut configs = self.configs.write().unwrap_or_else(|e| e.into_inner());
        configs.insert(config.kind, config);
    }

    pub fn set_active(&self, kind: ProviderKind) {
        *self.active.write().unwrap_or_else(|e| e.into_inner()) = kind;
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn active_kind(&self) -> Result<ProviderKind> {
        Ok(*self.active.read().map_err(|_| CdnError::internal("credential store poisoned"))?)
    }

    async fn load(&self, kind: ProviderKind) -> Result<ProviderConfig> {
        let configs =
            self.configs.read().map_err(|_| CdnError::internal("credential store poisoned"))?;
        Ok(configs.get(&kind).cloned().unwrap_or_else(|| ProviderConfig::new(kind)))
    }
}
