//! # Provider Credentials
//!
//! Hosts own credential storage. The gateway only asks a [`CredentialStore`]
//! for a fresh [`ProviderConfig`] snapshot per operation.

pub mod env;
pub mod memory;

pub use env::EnvCredentialStore;
pub use memory::StaticCredentialStore;

use async_trait::async_trait;

use crate::domain::{ProviderConfig, ProviderKind};
use crate::errors::Result;

/// Source of provider configuration snapshots.
///
/// Implementations must return a new snapshot on every call so that host
/// side edits are picked up without restarting anything.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Provider the host has selected
    async fn active_kind(&self) -> Result<ProviderKind>;

    /// Configuration for `kind`. Absent credentials are not an error here;
    /// the provider client reports them when an operation needs them.
    async fn load(&self, kind: ProviderKind) -> Result<ProviderConfig>;

    /// Configuration for the active provider
    async fn load_active(&self) -> Result<ProviderConfig> {
        let kind = self.active_kind().await?;
        self.load(kind).await
    }
}
