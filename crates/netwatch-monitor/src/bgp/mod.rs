//! RIS Live subscriber: a single streaming WebSocket subscription to a
//! route collector, with at-least-once reconnect and resubscribe.
//!
//! The subscription set is the canonical state; the socket is
//! disposable. Every (re)connect replays one subscribe frame per
//! monitored ASN, and the stream loop enforces liveness with a 60-second
//! read deadline and 30-second keepalive pings.

pub mod wire;

use crate::store::StateStore;
use crate::{MonitorError, Result};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use netwatch_core::types::asn_number;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wire::{Envelope, ErrorMessage, SubscribeFrame, UpdateMessage};

/// An established collector connection.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsSink = SplitSink<WsStream, Message>;

/// WebSocket handshake budget.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// A healthy stream delivers something within this window.
const READ_DEADLINE: Duration = Duration::from_secs(60);

/// Keepalive ping cadence.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Budget for a control-frame write.
const WRITE_DEADLINE: Duration = Duration::from_secs(5);

/// Pause before redialing a dropped connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Pause after a failed redial attempt.
const REDIAL_RETRY_DELAY: Duration = Duration::from_secs(10);

enum SessionEnd {
    Cancelled,
    Errored,
}

struct SubscriberInner {
    url: String,
    store: Arc<StateStore>,
    /// Canonical `ASnnnn` strings, replayed on every reconnect
    subscribed: Mutex<BTreeSet<String>>,
    reconnecting: AtomicBool,
}

/// Streaming BGP subscriber.
#[derive(Clone)]
pub struct RisSubscriber {
    inner: Arc<SubscriberInner>,
}

impl RisSubscriber {
    /// Create a subscriber over the given monitored set.
    #[must_use]
    pub fn new(url: impl Into<String>, asns: &[String], store: Arc<StateStore>) -> Self {
        Self {
            inner: Arc::new(SubscriberInner {
                url: url.into(),
                store,
                subscribed: Mutex::new(asns.iter().cloned().collect()),
                reconnecting: AtomicBool::new(false),
            }),
        }
    }

    /// The remembered subscription set.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.inner.subscribed.lock().iter().cloned().collect()
    }

    /// Dial the collector and replay the subscription set.
    ///
    /// The boot sequence calls this once and treats failure as fatal;
    /// the reconnect path calls it again for every redial.
    pub async fn connect(&self) -> Result<WsStream> {
        let dial = connect_async(self.inner.url.as_str());
        let (mut ws, _response) = tokio::time::timeout(HANDSHAKE_TIMEOUT, dial)
            .await
            .map_err(|_| MonitorError::HandshakeTimeout(HANDSHAKE_TIMEOUT))??;

        for asn in self.subscriptions() {
            let frame = SubscribeFrame::updates_for(asn_number(&asn));
            let text = serde_json::to_string(&frame)?;
            ws.send(Message::Text(text)).await?;
        }
        debug!(url = %self.inner.url, "subscribed to route collector");
        Ok(ws)
    }

    /// Stream until cancellation.
    ///
    /// `initial` is the boot-established socket; when absent (or after
    /// any stream error) the subscriber redials with backoff and replays
    /// its subscriptions.
    pub async fn run(&self, initial: Option<WsStream>, token: CancellationToken) {
        let mut current = initial;
        loop {
            let ws = match current.take() {
                Some(ws) => ws,
                None => match self.redial(&token).await {
                    Some(ws) => ws,
                    None => return,
                },
            };

            match self.stream_session(ws, &token).await {
                SessionEnd::Cancelled => return,
                SessionEnd::Errored => {}
            }
        }
    }

    /// One connection's read loop: dispatch messages, ping on idle
    /// writes, bail out on any read failure.
    async fn stream_session(&self, ws: WsStream, token: &CancellationToken) -> SessionEnd {
        let (mut sink, mut stream) = ws.split();
        let mut ping_deadline = tokio::time::Instant::now() + PING_INTERVAL;
        let mut message_count: u64 = 0;

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    let _ = sink.close().await;
                    return SessionEnd::Cancelled;
                }
                () = tokio::time::sleep_until(ping_deadline) => {
                    self.send_ping(&mut sink).await;
                    ping_deadline = tokio::time::Instant::now() + PING_INTERVAL;
                }
                read = tokio::time::timeout(READ_DEADLINE, stream.next()) => {
                    match read {
                        Ok(Some(Ok(message))) => {
                            message_count += 1;
                            if message_count % 10_000 == 0 {
                                debug!(messages = message_count, "stream healthy");
                            }
                            self.handle_message(&message);
                        }
                        Ok(Some(Err(e))) => {
                            warn!(error = %e, "stream read error, reconnecting");
                            return SessionEnd::Errored;
                        }
                        Ok(None) => {
                            warn!("collector closed the stream, reconnecting");
                            return SessionEnd::Errored;
                        }
                        Err(_) => {
                            warn!(deadline = ?READ_DEADLINE, "read deadline exceeded, reconnecting");
                            return SessionEnd::Errored;
                        }
                    }
                }
            }
        }
    }

    /// Keepalive ping. Failure is logged, not fatal; the next read
    /// deadline enforces actual liveness.
    async fn send_ping(&self, sink: &mut WsSink) {
        match tokio::time::timeout(WRITE_DEADLINE, sink.send(Message::Ping(Vec::new()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "keepalive ping failed"),
            Err(_) => warn!(deadline = ?WRITE_DEADLINE, "keepalive ping missed write deadline"),
        }
    }

    /// Redial loop: 2s + jitter before each attempt, 10s after a failed
    /// one, until connected or cancelled. A flag prevents concurrent
    /// redials of the same subscriber.
    async fn redial(&self, token: &CancellationToken) -> Option<WsStream> {
        if self.inner.reconnecting.swap(true, Ordering::SeqCst) {
            warn!("reconnect already in progress");
            return None;
        }
        let guard = ReconnectGuard(&self.inner.reconnecting);

        loop {
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=500));
            if !cancellable_sleep(RECONNECT_DELAY + jitter, token).await {
                return None;
            }

            match self.connect().await {
                Ok(ws) => {
                    info!("reconnected to route collector");
                    drop(guard);
                    return Some(ws);
                }
                Err(e) => {
                    warn!(error = %e, retry_in = ?REDIAL_RETRY_DELAY, "reconnect failed");
                    if !cancellable_sleep(REDIAL_RETRY_DELAY, token).await {
                        return None;
                    }
                }
            }
        }
    }

    fn handle_message(&self, message: &Message) {
        if !message.is_text() {
            return;
        }
        if let Ok(text) = message.to_text() {
            self.handle_text(text);
        }
    }

    fn handle_text(&self, text: &str) {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "undecodable collector message");
                return;
            }
        };

        match envelope.kind.as_str() {
            "ris_message" => {
                let update: UpdateMessage = match serde_json::from_value(envelope.data) {
                    Ok(update) => update,
                    Err(e) => {
                        warn!(error = %e, "undecodable ris_message payload");
                        return;
                    }
                };
                if update.kind != "UPDATE" {
                    return;
                }

                let seen_at = update.seen_at();
                let subscribed = self.inner.subscribed.lock().clone();
                for asn in &subscribed {
                    if update.mentions(asn_number(asn)) {
                        self.inner.store.update_asn_from_bgp(asn, seen_at);
                    }
                }
            }
            "ris_error" => {
                if let Ok(error) = serde_json::from_value::<ErrorMessage>(envelope.data) {
                    warn!(message = %error.message, "collector reported an error");
                }
            }
            _ => {}
        }
    }
}

/// Clears the reconnect flag even when the redial loop is cancelled.
struct ReconnectGuard<'a>(&'a AtomicBool);

impl Drop for ReconnectGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sleep unless cancelled first; returns `false` on cancellation.
async fn cancellable_sleep(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        () = token.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_core::DnsServerEntry;

    fn test_store(asns: &[&str]) -> Arc<StateStore> {
        let asns: Vec<String> = asns.iter().map(|s| (*s).to_string()).collect();
        let dns: Vec<DnsServerEntry> = Vec::new();
        Arc::new(StateStore::new(
            &asns,
            &dns,
            chrono::Duration::minutes(30),
            true,
        ))
    }

    fn subscriber(store: Arc<StateStore>, asns: &[&str]) -> RisSubscriber {
        let asns: Vec<String> = asns.iter().map(|s| (*s).to_string()).collect();
        RisSubscriber::new("ws://127.0.0.1:1", &asns, store)
    }

    #[test]
    fn update_from_peer_stamps_last_seen() {
        let store = test_store(&["AS13335", "AS44244"]);
        let sub = subscriber(store.clone(), &["AS13335", "AS44244"]);

        sub.handle_text(
            r#"{"type":"ris_message","data":{"type":"UPDATE","peer_asn":"13335","timestamp":1748736000.0}}"#,
        );

        let snapshot = store.snapshot();
        assert!(snapshot.asns["AS13335"].connected);
        assert_eq!(
            snapshot.asns["AS13335"].last_seen.unwrap().timestamp(),
            1_748_736_000
        );
        assert!(!snapshot.asns["AS44244"].connected);
    }

    #[test]
    fn update_through_as_path_set_stamps_all_mentioned() {
        let store = test_store(&["AS13335", "AS44244"]);
        let sub = subscriber(store.clone(), &["AS13335", "AS44244"]);

        sub.handle_text(
            r#"{"type":"ris_message","data":{"type":"UPDATE","peer_asn":"7018","timestamp":1748736000.0,"path":[7018,[12345,13335],44244]}}"#,
        );

        let snapshot = store.snapshot();
        assert!(snapshot.asns["AS13335"].connected);
        assert!(snapshot.asns["AS44244"].connected);
    }

    #[test]
    fn non_update_and_error_envelopes_ignored() {
        let store = test_store(&["AS13335"]);
        let sub = subscriber(store.clone(), &["AS13335"]);

        sub.handle_text(
            r#"{"type":"ris_message","data":{"type":"OPEN","peer_asn":"13335","timestamp":1.0}}"#,
        );
        sub.handle_text(r#"{"type":"ris_error","data":{"message":"nope"}}"#);
        sub.handle_text("not json at all");

        assert!(!store.snapshot().asns["AS13335"].connected);
    }

    #[test]
    fn empty_subscription_set_ignores_everything() {
        let store = test_store(&[]);
        let sub = subscriber(store.clone(), &[]);
        sub.handle_text(
            r#"{"type":"ris_message","data":{"type":"UPDATE","peer_asn":"13335","timestamp":1.0}}"#,
        );
        assert!(store.snapshot().asns.is_empty());
    }

    #[tokio::test]
    async fn reconnects_and_resubscribes_after_drop() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, mut frames_rx) = tokio::sync::mpsc::unbounded_channel::<(usize, String)>();

        // A collector that accepts, records two subscribe frames, then
        // drops the connection; the second session is kept open.
        tokio::spawn(async move {
            for round in 0..2usize {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                let mut seen = 0;
                while seen < 2 {
                    match ws.next().await {
                        Some(Ok(message)) if message.is_text() => {
                            let _ = frames_tx
                                .send((round, message.to_text().unwrap().to_string()));
                            seen += 1;
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    }
                }
                if round == 0 {
                    drop(ws);
                } else {
                    // Hold the second session open until the test ends.
                    while let Some(Ok(_)) = ws.next().await {}
                }
            }
        });

        let store = test_store(&["AS13335", "AS44244"]);
        let asns = vec![String::from("AS13335"), String::from("AS44244")];
        let sub = RisSubscriber::new(format!("ws://{addr}"), &asns, store);

        let ws = sub.connect().await.expect("initial dial");
        let token = CancellationToken::new();
        let runner = sub.clone();
        let run_token = token.clone();
        let handle = tokio::spawn(async move { runner.run(Some(ws), run_token).await });

        // First session's subscribe frames.
        for _ in 0..2 {
            let (round, frame) = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
                .await
                .expect("first-session frame")
                .unwrap();
            assert_eq!(round, 0);
            let frame: SubscribeFrame = serde_json::from_str(&frame).unwrap();
            assert_eq!(frame.kind, "ris_subscribe");
        }

        // After the drop the subscriber must redial and replay both
        // frames well within the 15s contract.
        let mut replayed = Vec::new();
        for _ in 0..2 {
            let (round, frame) = tokio::time::timeout(Duration::from_secs(15), frames_rx.recv())
                .await
                .expect("resubscribe frame")
                .unwrap();
            assert_eq!(round, 1);
            let frame: SubscribeFrame = serde_json::from_str(&frame).unwrap();
            replayed.push(frame.data.peer_asn);
        }
        replayed.sort();
        assert_eq!(replayed, vec!["13335", "44244"]);

        token.cancel();
        let _ = handle.await;
    }
}
