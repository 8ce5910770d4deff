//! Gateway services
//!
//! Orchestration on top of the provider clients: purge runs, analytics
//! normalization, zone resolution and the [`CdnGateway`] façade that ties
//! them to a credential store.

pub mod gateway;
pub mod purge_orchestrator;
pub mod stats_aggregator;
pub mod zone_resolver;

pub use gateway::CdnGateway;
pub use purge_orchestrator::PurgeOrchestrator;
pub use stats_aggregator::StatsAggregator;
pub use zone_resolver::ZoneResolver;
