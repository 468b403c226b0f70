//! The state store: single custodian of the merged monitoring view.
//!
//! All writes go through one reader-writer lock, taken for the duration
//! of a whole publish (never per entry), so a reader always sees a
//! prefix-consistent merge. Snapshots are full value copies; nothing
//! mutable ever leaks to a reader.

use chrono::Utc;
use netwatch_core::config::curation;
use netwatch_core::types::{AsnRecord, AsnTraffic, DnsKey, DnsRecord, Snapshot, TrafficSample};
use netwatch_core::{Config, DnsServerEntry};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

struct StoreInner {
    asns: BTreeMap<String, AsnRecord>,
    dns: BTreeMap<DnsKey, DnsRecord>,
    traffic: Option<TrafficSample>,
    asn_traffic: Option<Vec<AsnTraffic>>,
}

/// Merged snapshot state with a fixed key universe.
///
/// The ASN map's key set is pinned to the configured subscription set at
/// construction and never grows or shrinks; likewise every configured
/// DNS `(address, name)` pair has an entry from the start.
pub struct StateStore {
    connected_window: chrono::Duration,
    sticky_dns_alive: bool,
    inner: RwLock<StoreInner>,
}

impl StateStore {
    /// Seed a store from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.asns,
            &config.dns_servers,
            chrono::Duration::from_std(config.connected_window)
                .unwrap_or_else(|_| chrono::Duration::minutes(30)),
            config.sticky_dns_alive,
        )
    }

    /// Seed a store with explicit key sets.
    #[must_use]
    pub fn new(
        asns: &[String],
        dns_servers: &[DnsServerEntry],
        connected_window: chrono::Duration,
        sticky_dns_alive: bool,
    ) -> Self {
        let asn_map = asns
            .iter()
            .map(|asn| {
                let name = curation::asn_name(asn).map(String::from);
                (asn.clone(), AsnRecord::new(asn.clone(), name))
            })
            .collect();

        let dns_map = dns_servers
            .iter()
            .map(|entry| {
                let record = DnsRecord::new(&entry.address, &entry.name, entry.kind);
                (record.key(), record)
            })
            .collect();

        Self {
            connected_window,
            sticky_dns_alive,
            inner: RwLock::new(StoreInner {
                asns: asn_map,
                dns: dns_map,
                traffic: None,
                asn_traffic: None,
            }),
        }
    }

    /// Stamp an ASN's last-seen from a BGP update.
    ///
    /// Unknown ASNs are ignored; the key set is fixed at startup. The
    /// `connected` flag written here is provisional, the snapshot export
    /// recomputes it.
    pub fn update_asn_from_bgp(&self, asn: &str, seen_at: chrono::DateTime<Utc>) {
        let mut inner = self.inner.write();
        if let Some(record) = inner.asns.get_mut(asn) {
            record.connected = true;
            record.last_seen = Some(seen_at);
            record.last_update = Some(Utc::now());
        }
    }

    /// Publish one complete DNS probe round.
    ///
    /// Two-pass merge: first the round-wide set of addresses seen alive
    /// by at least one probe upgrades every result sharing such an
    /// address (liveness belongs to the address, not the label); then
    /// each key overwrites its prior record, except that an alive record
    /// is kept over a failing result for the same key while
    /// `sticky_dns_alive` is set.
    pub fn publish_dns_round(&self, results: Vec<DnsRecord>) {
        let alive_addresses: BTreeSet<String> = results
            .iter()
            .filter(|r| r.alive)
            .map(|r| r.address.clone())
            .collect();

        let mut inner = self.inner.write();
        for mut record in results {
            if !record.alive && alive_addresses.contains(&record.address) {
                record.alive = true;
                record.last_error.clear();
            }

            let key = record.key();
            if self.sticky_dns_alive && !record.alive {
                if let Some(existing) = inner.dns.get(&key) {
                    if existing.alive {
                        continue;
                    }
                }
            }
            inner.dns.insert(key, record);
        }
    }

    /// Replace the country traffic sample.
    pub fn publish_country_traffic(&self, sample: TrafficSample) {
        self.inner.write().traffic = Some(sample);
    }

    /// Replace the per-ASN traffic sample (absent is a valid state).
    pub fn publish_per_asn_traffic(&self, sample: Option<Vec<AsnTraffic>>) {
        self.inner.write().asn_traffic = sample;
    }

    /// Export a value-typed snapshot.
    ///
    /// `connected` is derived here, at read time, from `last_seen` and
    /// the configured window; this derivation is the authoritative one.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let now = Utc::now();
        let inner = self.inner.read();

        let mut asns = inner.asns.clone();
        for record in asns.values_mut() {
            record.connected = record.connected_at(now, self.connected_window);
        }

        Snapshot {
            taken_at: now,
            asns,
            dns: inner.dns.clone(),
            traffic: inner.traffic.clone(),
            asn_traffic: inner.asn_traffic.clone(),
        }
    }

    /// Periodic consistency sweep: re-derive the stored `connected`
    /// flags and log transitions to offline.
    pub fn sweep(&self) {
        let now = Utc::now();
        let window = self.connected_window;
        let mut inner = self.inner.write();
        for record in inner.asns.values_mut() {
            let derived = record.connected_at(now, window);
            if record.connected && !derived {
                let since = record
                    .last_seen
                    .map(|seen| now.signed_duration_since(seen));
                info!(
                    asn = %record.asn,
                    name = record.name.as_deref().unwrap_or(""),
                    last_seen_ago = ?since,
                    "ASN marked offline"
                );
            }
            record.connected = derived;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_core::types::ResolverKind;
    use std::time::Duration as StdDuration;

    fn store() -> StateStore {
        StateStore::new(
            &[String::from("AS13335"), String::from("AS44244")],
            &[
                DnsServerEntry::new("1.1.1.1", "A", ResolverKind::Recursive),
                DnsServerEntry::new("9.9.9.9", "B", ResolverKind::Recursive),
            ],
            chrono::Duration::minutes(30),
            true,
        )
    }

    fn probe_result(address: &str, name: &str, alive: bool, error: &str) -> DnsRecord {
        let mut record = DnsRecord::new(address, name, ResolverKind::Recursive);
        record.alive = alive;
        record.last_error = error.to_string();
        record.last_check = Some(Utc::now());
        record.response_time = StdDuration::from_millis(12);
        record
    }

    #[test]
    fn snapshot_contains_every_configured_asn() {
        let snapshot = store().snapshot();
        assert_eq!(snapshot.asns.len(), 2);
        assert!(snapshot.asns.contains_key("AS13335"));
        assert!(snapshot.asns.contains_key("AS44244"));
        assert!(snapshot.asns.values().all(|a| !a.connected));
    }

    #[test]
    fn snapshot_contains_every_configured_dns_key() {
        let snapshot = store().snapshot();
        assert_eq!(snapshot.dns.len(), 2);
        let record = &snapshot.dns[&DnsKey::new("1.1.1.1", "A")];
        assert!(!record.alive);
        assert!(record.last_check.is_none());
    }

    #[test]
    fn empty_asn_set_yields_empty_map() {
        let store = StateStore::new(&[], &[], chrono::Duration::minutes(30), true);
        store.update_asn_from_bgp("AS13335", Utc::now());
        assert!(store.snapshot().asns.is_empty());
    }

    #[test]
    fn bgp_update_drives_connected_derivation() {
        let store = store();
        let t0 = Utc::now();
        store.update_asn_from_bgp("AS13335", t0);

        let snapshot = store.snapshot();
        assert!(snapshot.asns["AS13335"].connected);
        assert_eq!(snapshot.asns["AS13335"].last_seen, Some(t0));
        assert!(!snapshot.asns["AS44244"].connected);
    }

    #[test]
    fn stale_last_seen_is_disconnected() {
        let store = store();
        store.update_asn_from_bgp("AS13335", Utc::now() - chrono::Duration::minutes(31));
        assert!(!store.snapshot().asns["AS13335"].connected);
    }

    #[test]
    fn unknown_asn_update_ignored() {
        let store = store();
        store.update_asn_from_bgp("AS99999", Utc::now());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.asns.len(), 2);
        assert!(!snapshot.asns.contains_key("AS99999"));
    }

    #[test]
    fn reapplying_same_update_is_idempotent() {
        let store = store();
        let t0 = Utc::now();
        store.update_asn_from_bgp("AS13335", t0);
        let first = store.snapshot();
        store.update_asn_from_bgp("AS13335", t0);
        let second = store.snapshot();
        assert_eq!(first.asns["AS13335"].connected, second.asns["AS13335"].connected);
        assert_eq!(first.asns["AS13335"].last_seen, second.asns["AS13335"].last_seen);
    }

    #[test]
    fn shared_address_upgraded_within_round() {
        // Two curated entries share 8.8.8.8; the probe for "Y" timed out.
        let store = StateStore::new(
            &[],
            &[
                DnsServerEntry::new("8.8.8.8", "X", ResolverKind::Recursive),
                DnsServerEntry::new("8.8.8.8", "Y", ResolverKind::Recursive),
            ],
            chrono::Duration::minutes(30),
            true,
        );
        store.publish_dns_round(vec![
            probe_result("8.8.8.8", "X", true, ""),
            probe_result("8.8.8.8", "Y", false, "Network error: timed out"),
        ]);

        let snapshot = store.snapshot();
        let x = &snapshot.dns[&DnsKey::new("8.8.8.8", "X")];
        let y = &snapshot.dns[&DnsKey::new("8.8.8.8", "Y")];
        assert!(x.alive && y.alive);
        assert!(x.last_error.is_empty());
        assert!(y.last_error.is_empty());
    }

    #[test]
    fn snapshot_addresses_agree_on_liveness() {
        let store = StateStore::new(
            &[],
            &[
                DnsServerEntry::new("8.8.8.8", "X", ResolverKind::Recursive),
                DnsServerEntry::new("8.8.8.8", "Y", ResolverKind::Recursive),
                DnsServerEntry::new("9.9.9.9", "Z", ResolverKind::Recursive),
            ],
            chrono::Duration::minutes(30),
            true,
        );
        store.publish_dns_round(vec![
            probe_result("8.8.8.8", "X", false, "refused"),
            probe_result("8.8.8.8", "Y", true, ""),
            probe_result("9.9.9.9", "Z", false, "timeout"),
        ]);

        let snapshot = store.snapshot();
        let mut by_address: BTreeMap<&str, BTreeSet<bool>> = BTreeMap::new();
        for record in snapshot.dns.values() {
            by_address
                .entry(record.address.as_str())
                .or_default()
                .insert(record.alive);
        }
        for (address, states) in by_address {
            assert_eq!(states.len(), 1, "records for {address} disagree on liveness");
        }
    }

    #[test]
    fn sticky_alive_survives_single_failing_round() {
        let store = store();
        store.publish_dns_round(vec![probe_result("1.1.1.1", "A", true, "")]);
        store.publish_dns_round(vec![probe_result("1.1.1.1", "A", false, "timeout")]);

        let record = &store.snapshot().dns[&DnsKey::new("1.1.1.1", "A")];
        assert!(record.alive, "alive record overwritten by failing probe");
    }

    #[test]
    fn non_sticky_round_overwrites() {
        let store = StateStore::new(
            &[],
            &[DnsServerEntry::new("1.1.1.1", "A", ResolverKind::Recursive)],
            chrono::Duration::minutes(30),
            false,
        );
        store.publish_dns_round(vec![probe_result("1.1.1.1", "A", true, "")]);
        store.publish_dns_round(vec![probe_result("1.1.1.1", "A", false, "timeout")]);

        let record = &store.snapshot().dns[&DnsKey::new("1.1.1.1", "A")];
        assert!(!record.alive);
        assert_eq!(record.last_error, "timeout");
    }

    #[test]
    fn publishing_same_round_twice_is_idempotent() {
        let store = store();
        let round = vec![
            probe_result("1.1.1.1", "A", true, ""),
            probe_result("9.9.9.9", "B", false, "timeout"),
        ];
        store.publish_dns_round(round.clone());
        let first = store.snapshot();
        store.publish_dns_round(round);
        let second = store.snapshot();
        assert_eq!(first.dns, second.dns);
    }

    #[test]
    fn snapshot_twice_without_writes_is_equal() {
        let store = store();
        store.update_asn_from_bgp("AS13335", Utc::now());
        store.publish_dns_round(vec![probe_result("1.1.1.1", "A", true, "")]);

        let a = store.snapshot();
        let b = store.snapshot();
        assert_eq!(a.asns, b.asns);
        assert_eq!(a.dns, b.dns);
        assert_eq!(a.traffic, b.traffic);
        assert_eq!(a.asn_traffic, b.asn_traffic);
    }

    #[test]
    fn traffic_published_by_replacement() {
        use netwatch_core::types::{TrafficStatus};

        let store = store();
        assert!(store.snapshot().traffic.is_none());

        let sample = TrafficSample {
            current_level: 100.0,
            trend: vec![100.0; 24],
            timestamps: (0..24)
                .map(|i| Utc::now() - chrono::Duration::hours(23 - i))
                .collect(),
            baseline_percent: 100.0,
            change_percent: 0.0,
            status: TrafficStatus::Normal,
            fetched_at: Utc::now(),
        };
        store.publish_country_traffic(sample.clone());
        assert_eq!(store.snapshot().traffic, Some(sample));

        store.publish_per_asn_traffic(None);
        assert!(store.snapshot().asn_traffic.is_none());
    }

    #[test]
    fn sweep_rederives_stored_flags() {
        let store = store();
        store.update_asn_from_bgp("AS13335", Utc::now() - chrono::Duration::hours(2));
        store.sweep();
        // The stored flag now matches the derivation; the snapshot agrees.
        assert!(!store.snapshot().asns["AS13335"].connected);
    }
}
