//! netwatch-monitor: the monitoring engine.
//!
//! Three pipelines feed one state store:
//! - a persistent RIS Live WebSocket subscriber stamps per-ASN last-seen
//!   from BGP UPDATE messages ([`bgp`]);
//! - a concurrent prober measures liveness and latency of the curated
//!   resolvers ([`dns`]);
//! - the Radar client (netwatch-radar) supplies country-level traffic.
//!
//! The [`store::StateStore`] is the single custodian of the merged view
//! and exports value-typed [`Snapshot`](netwatch_core::types::Snapshot)s.
//! The [`publish::Publisher`] ticks independently, snapshots the store
//! and fans out text segments and charts through the adapter seams in
//! [`adapters`].

pub mod adapters;
pub mod bgp;
pub mod dns;
pub mod engine;
pub mod error;
pub mod publish;
pub mod store;

pub use engine::Monitor;
pub use error::MonitorError;
pub use store::StateStore;

/// Result type for monitoring operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
