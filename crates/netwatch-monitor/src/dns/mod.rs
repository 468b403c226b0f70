//! DNS prober: concurrent liveness rounds over the curated resolvers.

mod probe;

pub use probe::TEST_DOMAIN;

use crate::store::StateStore;
use netwatch_core::types::DnsRecord;
use netwatch_core::DnsServerEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Floor for the per-attempt exchange deadline.
const MIN_TIMEOUT: Duration = Duration::from_secs(8);

/// Concurrent resolver prober.
///
/// Each round launches one task per curated entry, joins them all, and
/// publishes the complete round to the state store in one batch so the
/// address-level reconciliation sees every outcome at once.
pub struct DnsProber {
    servers: Vec<DnsServerEntry>,
    timeout: Duration,
    store: Arc<StateStore>,
}

impl DnsProber {
    #[must_use]
    pub fn new(servers: Vec<DnsServerEntry>, timeout: Duration, store: Arc<StateStore>) -> Self {
        Self {
            servers,
            timeout: timeout.max(MIN_TIMEOUT),
            store,
        }
    }

    /// Probe every resolver in parallel and publish the round.
    pub async fn probe_all(&self) -> Vec<DnsRecord> {
        let mut tasks = Vec::with_capacity(self.servers.len());
        for server in self.servers.iter().cloned() {
            let timeout = self.timeout;
            tasks.push(tokio::spawn(probe::probe_server(server, timeout)));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(record) => results.push(record),
                Err(e) => warn!(error = %e, "probe task aborted"),
            }
        }

        debug!(
            probed = results.len(),
            alive = results.iter().filter(|r| r.alive).count(),
            "DNS round complete"
        );
        self.store.publish_dns_round(results.clone());
        results
    }

    /// Repeat `probe_all` on each tick until cancelled.
    ///
    /// No probe on entry: the boot sequence runs the first round
    /// synchronously before any publication.
    pub async fn run_periodic(&self, interval: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = token.cancelled() => return,
                _ = ticker.tick() => {
                    debug!("periodic DNS round");
                    self.probe_all().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_core::types::{DnsKey, ResolverKind};

    #[tokio::test]
    async fn round_publishes_every_configured_key() {
        // Unreachable-by-parse addresses keep the test off the network.
        let servers = vec![
            DnsServerEntry::new("bogus-one", "A", ResolverKind::Recursive),
            DnsServerEntry::new("bogus-two", "B", ResolverKind::Recursive),
        ];
        let store = Arc::new(StateStore::new(
            &[],
            &servers,
            chrono::Duration::minutes(30),
            true,
        ));
        let prober = DnsProber::new(servers, Duration::from_secs(8), store.clone());

        let results = prober.probe_all().await;
        assert_eq!(results.len(), 2);

        let snapshot = store.snapshot();
        for record in snapshot.dns.values() {
            assert!(!record.alive);
            assert!(record.last_check.is_some(), "round must stamp last_check");
        }
        assert!(snapshot.dns.contains_key(&DnsKey::new("bogus-one", "A")));
    }

    #[test]
    fn timeout_floor_applied() {
        let store = Arc::new(StateStore::new(&[], &[], chrono::Duration::minutes(30), true));
        let prober = DnsProber::new(Vec::new(), Duration::from_secs(2), store);
        assert_eq!(prober.timeout, Duration::from_secs(8));
    }
}
