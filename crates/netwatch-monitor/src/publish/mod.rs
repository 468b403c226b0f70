//! Periodic snapshot publication.
//!
//! The publisher polls at one-second resolution so a subscriber
//! interval change takes effect within a second, without restarting
//! anything. Channel publication runs on its own fixed cadence, with
//! the first send issued immediately after boot.

pub mod format;

use crate::adapters::{ChartRenderer, ChatTarget, ChatTransport};
use async_trait::async_trait;
use chrono::Utc;
use netwatch_core::types::Snapshot;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Channel publication cadence.
const CHANNEL_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Poll resolution for interval changes and due checks.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fallback per-subscriber cadence.
const DEFAULT_USER_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Anything that can produce a fresh snapshot on demand.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn observe(&self) -> Snapshot;
}

/// Fans snapshots out to the configured channel and to interactive
/// subscribers.
pub struct Publisher {
    source: Arc<dyn SnapshotSource>,
    chat: Arc<dyn ChatTransport>,
    charts: Arc<dyn ChartRenderer>,
    channel: Option<ChatTarget>,
    user_interval: Mutex<Duration>,
    subscribers: Mutex<BTreeSet<i64>>,
}

impl Publisher {
    #[must_use]
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        chat: Arc<dyn ChatTransport>,
        charts: Arc<dyn ChartRenderer>,
        channel: Option<ChatTarget>,
        user_interval: Duration,
    ) -> Self {
        let user_interval = if user_interval.is_zero() {
            DEFAULT_USER_INTERVAL
        } else {
            user_interval
        };
        Self {
            source,
            chat,
            charts,
            channel,
            user_interval: Mutex::new(user_interval),
            subscribers: Mutex::new(BTreeSet::new()),
        }
    }

    /// Current per-subscriber interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        *self.user_interval.lock()
    }

    /// Change the per-subscriber interval; the running loop picks the
    /// new value up within one second.
    pub fn set_interval(&self, interval: Duration) {
        let interval = if interval.is_zero() {
            DEFAULT_USER_INTERVAL
        } else {
            interval
        };
        *self.user_interval.lock() = interval;
    }

    /// Register an interactive subscriber chat.
    pub fn subscribe(&self, chat_id: i64) {
        self.subscribers.lock().insert(chat_id);
    }

    /// One-off publication to a single target (interactive requests).
    pub async fn publish_to(&self, target: &ChatTarget) {
        let snapshot = self.source.observe().await;
        self.send_snapshot(target, &snapshot).await;
    }

    /// Publication loop; 1s polling, runs until cancelled.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        let mut last_interval = self.interval();
        let mut last_user_send = Instant::now();
        // None forces the first channel publication immediately.
        let mut last_channel_send: Option<Instant> = None;

        info!(
            user_interval = ?last_interval,
            channel = self.channel.as_ref().map(ToString::to_string),
            "publication loop started"
        );

        loop {
            tokio::select! {
                () = token.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let current = self.interval();
            if current != last_interval {
                info!(from = ?last_interval, to = ?current, "publication interval changed");
                if last_user_send.elapsed() < current {
                    // Not yet due under the new interval: wait a full
                    // period from the change.
                    last_user_send = Instant::now();
                }
                last_interval = current;
            }

            let channel_due = self.channel.is_some()
                && last_channel_send.map_or(true, |t| t.elapsed() >= CHANNEL_INTERVAL);

            let subscriber_ids: Vec<i64> = self.subscribers.lock().iter().copied().collect();
            let user_due = !subscriber_ids.is_empty() && last_user_send.elapsed() >= current;

            if !channel_due && !user_due {
                continue;
            }

            let snapshot = self.source.observe().await;

            if channel_due {
                if let Some(channel) = &self.channel {
                    debug!(channel = %channel, "publishing to channel");
                    self.send_snapshot(channel, &snapshot).await;
                    last_channel_send = Some(Instant::now());
                }
            }
            if user_due {
                debug!(subscribers = subscriber_ids.len(), "publishing to subscribers");
                for id in subscriber_ids {
                    self.send_snapshot(&ChatTarget::Chat(id), &snapshot).await;
                }
                last_user_send = Instant::now();
            }
        }
    }

    /// Fixed send order: header, ASN section, DNS section, country
    /// chart with caption, per-ASN chart with caption. Absent samples
    /// and failed renders are omitted, never fatal.
    async fn send_snapshot(&self, target: &ChatTarget, snapshot: &Snapshot) {
        self.send_text(target, &format::header_section(snapshot)).await;
        self.send_text(target, &format::asn_section(snapshot)).await;
        self.send_text(target, &format::dns_section(snapshot)).await;

        if let Some(sample) = &snapshot.traffic {
            if let Some(png) = self.charts.render_traffic(sample) {
                let caption = format::traffic_caption(sample, Utc::now());
                if let Err(e) = self.chat.send_photo(target, &png, &caption).await {
                    warn!(target = %target, error = %e, "traffic chart send failed");
                }
            }
        }

        if let Some(entries) = snapshot.asn_traffic.as_deref().filter(|e| !e.is_empty()) {
            if let Some(png) = self.charts.render_asn_traffic(entries) {
                let caption = format::asn_traffic_caption(entries);
                if let Err(e) = self.chat.send_photo(target, &png, &caption).await {
                    warn!(target = %target, error = %e, "ASN chart send failed");
                }
            }
        }
    }

    async fn send_text(&self, target: &ChatTarget, text: &str) {
        if let Err(e) = self.chat.send_text(target, text).await {
            warn!(target = %target, error = %e, "text send failed");
        }
    }
}
