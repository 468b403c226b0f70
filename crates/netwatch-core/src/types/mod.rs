//! Record types shared across the monitoring pipelines.

mod asn;
mod dns;
mod snapshot;
mod traffic;

pub use asn::{asn_number, AsnRecord};
pub use dns::{DnsKey, DnsRecord, ResolverKind};
pub use snapshot::Snapshot;
pub use traffic::{AsnTraffic, AsnTrafficTier, TrafficSample, TrafficStatus};
