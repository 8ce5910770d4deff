//! Domain layer
//!
//! Pure value types shared by provider clients and services. Nothing in here
//! performs I/O.
//!
//! ## Module Organization
//!
//! - `provider`: provider kinds and immutable configuration snapshots
//! - `purge`: purge requests and the unified purge outcome
//! - `zone`: vendor zone descriptors and domain normalization
//! - `stats`: analytics windows and the normalized snapshot

pub mod provider;
pub mod purge;
pub mod stats;
pub mod zone;

pub use provider::{keys, ProviderConfig, ProviderKind};
pub use purge::{validate_urls, PurgeFailure, PurgeRequest, PurgeResult, PurgeScope};
pub use stats::{hit_ratio, RawStats, StatsSnapshot, StatsWindow};
pub use zone::{normalize_domain, ZoneInfo, ZoneStatus};
