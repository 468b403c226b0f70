//! Engine: boot sequence, background tasks and snapshot assembly.
//!
//! Boot opens the BGP subscription (fatal on failure), then runs the
//! eager Radar fetch and the first DNS round synchronously so the very
//! first publication already has data. After that, four supervised
//! tasks tick independently: the BGP stream, the DNS prober, the Radar
//! refresh and the state-store consistency sweep. A panic in any one of
//! them restarts that task; it never takes the process down.

use crate::bgp::RisSubscriber;
use crate::dns::DnsProber;
use crate::publish::SnapshotSource;
use crate::store::StateStore;
use crate::Result;
use async_trait::async_trait;
use netwatch_core::types::Snapshot;
use netwatch_core::Config;
use netwatch_radar::RadarClient;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause after boot so the fresh stream can deliver first updates.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Pause before restarting a panicked task.
const RESTART_DELAY: Duration = Duration::from_secs(1);

/// The assembled monitoring engine.
pub struct Monitor {
    config: Config,
    store: Arc<StateStore>,
    subscriber: RisSubscriber,
    prober: Arc<DnsProber>,
    radar: RadarClient,
    initial_ws: Mutex<Option<crate::bgp::WsStream>>,
}

impl Monitor {
    /// Boot sequence: seed the store, open the BGP subscription (errors
    /// here fail startup), fetch Radar and probe DNS once synchronously,
    /// then settle briefly.
    pub async fn boot(config: Config) -> Result<Arc<Self>> {
        let store = Arc::new(StateStore::from_config(&config));

        let subscriber =
            RisSubscriber::new(config.ris_live_url.clone(), &config.asns, store.clone());
        let ws = subscriber.connect().await?;
        info!(
            asns = config.asns.len(),
            resolvers = config.dns_servers.len(),
            url = %config.ris_live_url,
            "BGP subscription open"
        );

        let radar = RadarClient::from_config(&config);
        let prober = Arc::new(DnsProber::new(
            config.dns_servers.clone(),
            config.effective_probe_timeout(),
            store.clone(),
        ));

        // Radar first (it feeds the headline chart), tolerant of error.
        match radar.fetch().await {
            Ok(sample) => {
                info!(
                    level = sample.current_level,
                    status = sample.status.label(),
                    "initial traffic sample"
                );
                store.publish_country_traffic(sample);
            }
            Err(e) => warn!(error = %e, "initial radar fetch failed, continuing"),
        }

        let round = prober.probe_all().await;
        info!(
            alive = round.iter().filter(|r| r.alive).count(),
            probed = round.len(),
            "initial DNS round"
        );

        tokio::time::sleep(SETTLE_DELAY).await;

        Ok(Arc::new(Self {
            config,
            store,
            subscriber,
            prober,
            radar,
            initial_ws: Mutex::new(Some(ws)),
        }))
    }

    #[must_use]
    pub fn store(&self) -> Arc<StateStore> {
        self.store.clone()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Launch the background tasks, each inside a panic-isolating
    /// supervisor.
    pub fn spawn(&self, token: &CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(4);

        {
            let subscriber = self.subscriber.clone();
            // The boot socket feeds the first session only; a restarted
            // task starts from the redial path.
            let initial = Arc::new(Mutex::new(self.initial_ws.lock().take()));
            let task_token = token.clone();
            handles.push(supervise("bgp-stream", token.clone(), move || {
                let subscriber = subscriber.clone();
                let initial = initial.lock().take();
                let token = task_token.clone();
                async move { subscriber.run(initial, token).await }
            }));
        }

        {
            let prober = self.prober.clone();
            let interval = self.config.interval;
            let task_token = token.clone();
            handles.push(supervise("dns-prober", token.clone(), move || {
                let prober = prober.clone();
                let token = task_token.clone();
                async move { prober.run_periodic(interval, token).await }
            }));
        }

        {
            let radar = self.radar.clone();
            let task_token = token.clone();
            handles.push(supervise("radar-refresh", token.clone(), move || {
                let radar = radar.clone();
                let token = task_token.clone();
                async move { radar.run(token).await }
            }));
        }

        {
            let store = self.store.clone();
            let interval = self.config.interval;
            let task_token = token.clone();
            handles.push(supervise("state-sweep", token.clone(), move || {
                let store = store.clone();
                let token = task_token.clone();
                async move { sweep_loop(store, interval, token).await }
            }));
        }

        handles
    }
}

#[async_trait]
impl SnapshotSource for Monitor {
    /// Assemble a publication-ready snapshot: refresh traffic through
    /// the cache, attempt the best-effort per-ASN sample, then export.
    async fn observe(&self) -> Snapshot {
        match self.radar.get().await {
            Ok(sample) => self.store.publish_country_traffic(sample),
            Err(e) => debug!(error = %e, "traffic unavailable for this snapshot"),
        }

        if self.config.asn_traffic_enabled {
            match self.radar.fetch_asn_traffic(&self.config.asns).await {
                Ok(entries) if !entries.is_empty() => {
                    self.store.publish_per_asn_traffic(Some(entries));
                }
                Ok(_) => self.store.publish_per_asn_traffic(None),
                Err(e) => {
                    debug!(error = %e, "per-ASN traffic unavailable");
                    self.store.publish_per_asn_traffic(None);
                }
            }
        }

        self.store.snapshot()
    }
}

/// Periodic connectivity re-derivation over the stored ASN records.
async fn sweep_loop(store: Arc<StateStore>, interval: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            () = token.cancelled() => return,
            _ = ticker.tick() => store.sweep(),
        }
    }
}

/// Run a task factory under a restart-on-panic boundary.
///
/// A task that returns normally (cooperative cancellation) ends the
/// supervisor; a panicked task is logged and relaunched after a short
/// pause.
pub(crate) fn supervise<F, Fut>(
    name: &'static str,
    token: CancellationToken,
    mut make: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            if token.is_cancelled() {
                return;
            }
            let task = tokio::spawn(make());
            match task.await {
                Ok(()) => return,
                Err(e) if e.is_panic() => {
                    error!(task = name, "task panicked, restarting");
                    tokio::time::sleep(RESTART_DELAY).await;
                }
                Err(_) => return,
            }
        }
    })
}
