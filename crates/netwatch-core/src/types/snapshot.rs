//! Point-in-time snapshot of the merged monitoring state.

use super::{AsnRecord, AsnTraffic, DnsKey, DnsRecord, TrafficSample};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Immutable copy of the state store, produced on demand.
///
/// A snapshot is a value: readers may retain and iterate it without any
/// synchronization with the writers that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub asns: BTreeMap<String, AsnRecord>,
    pub dns: BTreeMap<DnsKey, DnsRecord>,
    pub traffic: Option<TrafficSample>,
    pub asn_traffic: Option<Vec<AsnTraffic>>,
}

impl Snapshot {
    /// Number of ASNs currently considered connected.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.asns.values().filter(|a| a.connected).count()
    }

    /// Number of resolver entries currently alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.dns.values().filter(|d| d.alive).count()
    }
}
