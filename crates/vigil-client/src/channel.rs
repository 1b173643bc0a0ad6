//! WebSocket live channel with reconnect and history reconciliation.
//!
//! The channel runs a simple state machine: `Disconnected -> Connecting ->
//! Connected -> (Disconnected | Error)`. Transport failures surface
//! distinctly from clean closes so an embedding UI can tell "never
//! connected" from "dropped". Reconnection is entirely client-driven, on a
//! fixed delay.
//!
//! The server buffers nothing for an absent subscriber, so every
//! (re)connect starts with a recent-history fetch; merged with
//! dedup-by-id, that closes the gap and upgrades delivery to
//! at-least-once end to end.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use vigil_hub::PushEvent;
use vigil_ingest::{normalize, RecentIds};
use vigil_types::Alert;

use crate::manager::AlertManager;

/// Fixed delay between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Default number of records fetched when reconciling history.
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Connection state of the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not connected and not trying.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connected and receiving pushes.
    Connected,
    /// The last attempt or session ended in a transport failure.
    Error,
}

/// Events surfaced to the embedding application.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Handshake completed.
    Connected,
    /// A new alert entered the working set (live push or history merge).
    Alert(Alert),
    /// Clean close, by either side.
    Disconnected,
    /// Connection-level failure, reported distinctly from a clean close.
    TransportError(String),
}

/// Configuration for a live channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:5001/ws`.
    pub ws_url: String,
    /// Recent-webhooks endpoint, e.g. `http://127.0.0.1:5001/api/webhooks`.
    pub history_url: String,
    /// Delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Number of records fetched when reconciling history.
    pub history_limit: usize,
}

impl ChannelConfig {
    /// Build a config for a server at `host:port`.
    pub fn for_host(host: &str) -> Self {
        Self {
            ws_url: format!("ws://{host}/ws"),
            history_url: format!("http://{host}/api/webhooks"),
            reconnect_delay: RECONNECT_DELAY,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

enum CloseReason {
    Clean,
    Transport(String),
    Shutdown,
}

/// Client side of the live delivery channel.
///
/// Owns the connection loop, the duplicate-suppression set, and the alert
/// working set it feeds. Call [`LiveChannel::run`] to drive the loop;
/// [`LiveChannel::disconnect`] tears down the timer and closes the channel.
pub struct LiveChannel {
    config: ChannelConfig,
    state: Mutex<ChannelState>,
    manager: Arc<Mutex<AlertManager>>,
    seen: Mutex<RecentIds>,
    http: reqwest::Client,
    events: mpsc::UnboundedSender<ChannelEvent>,
    shutdown: watch::Sender<bool>,
}

impl LiveChannel {
    /// Create a channel and the receiver for its surfaced events.
    pub fn new(config: ChannelConfig) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        let channel = Self {
            config,
            state: Mutex::new(ChannelState::Disconnected),
            manager: Arc::new(Mutex::new(AlertManager::new())),
            seen: Mutex::new(RecentIds::new()),
            http: reqwest::Client::new(),
            events,
            shutdown,
        };
        (channel, events_rx)
    }

    /// Current connection state.
    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    /// The working set this channel feeds.
    pub fn manager(&self) -> Arc<Mutex<AlertManager>> {
        Arc::clone(&self.manager)
    }

    /// Tear down the reconnect timer and close the channel. The running
    /// loop exits promptly and irrevocably.
    pub fn disconnect(&self) {
        self.shutdown.send_replace(true);
    }

    /// Drive the connect/receive/reconnect loop until [`disconnect`] is
    /// called.
    ///
    /// [`disconnect`]: LiveChannel::disconnect
    pub async fn run(&self) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.set_state(ChannelState::Connecting);

            match connect_async(self.config.ws_url.as_str()).await {
                Ok((stream, _)) => {
                    self.set_state(ChannelState::Connected);
                    let _ = self.events.send(ChannelEvent::Connected);
                    info!(url = %self.config.ws_url, "live channel connected");

                    // Cover whatever was missed while we were away before
                    // processing live pushes.
                    self.reconcile_history().await;

                    match self.pump(stream, &mut shutdown).await {
                        CloseReason::Clean => {
                            info!("live channel closed");
                            self.set_state(ChannelState::Disconnected);
                            let _ = self.events.send(ChannelEvent::Disconnected);
                        }
                        CloseReason::Transport(e) => {
                            warn!(error = %e, "live channel transport failure");
                            self.set_state(ChannelState::Error);
                            let _ = self.events.send(ChannelEvent::TransportError(e));
                        }
                        CloseReason::Shutdown => break,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "live channel connect failed");
                    self.set_state(ChannelState::Error);
                    let _ = self.events.send(ChannelEvent::TransportError(e.to_string()));
                }
            }

            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.set_state(ChannelState::Disconnected);
    }

    async fn pump(
        &self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> CloseReason {
        let (_write, mut read) = stream.split();

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                    Some(Ok(Message::Close(_))) | None => return CloseReason::Clean,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return CloseReason::Transport(e.to_string()),
                },
                _ = shutdown.changed() => return CloseReason::Shutdown,
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<PushEvent>(text) {
            Ok(PushEvent::ConnectionEstablished { message }) => {
                debug!(%message, "connection acknowledged");
            }
            Ok(PushEvent::Alert { payload }) => self.accept_alert(payload),
            Err(e) => warn!(error = %e, "unparseable push event"),
        }
    }

    fn accept_alert(&self, alert: Alert) {
        if !self.seen.lock().insert(&alert.id) {
            debug!(alert_id = %alert.id, "duplicate push suppressed");
            return;
        }
        self.manager.lock().add(alert.clone());
        let _ = self.events.send(ChannelEvent::Alert(alert));
    }

    /// Fetch recent history and merge it into the working set, dedup by id.
    async fn reconcile_history(&self) {
        let url = format!(
            "{}?limit={}",
            self.config.history_url, self.config.history_limit
        );

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "history fetch failed");
                return;
            }
        };
        let body: HistoryResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "history response unparseable");
                return;
            }
        };

        let mut batch = Vec::new();
        for record in body.webhooks {
            // Stored payloads are canonical alerts; anything older or
            // foreign goes back through the normalizer.
            let alert = match serde_json::from_value::<Alert>(record.data.clone()) {
                Ok(alert) => alert,
                Err(_) => normalize(&record.data),
            };
            if self.seen.lock().insert(&alert.id) {
                batch.push(alert);
            }
        }

        for alert in &batch {
            let _ = self.events.send(ChannelEvent::Alert(alert.clone()));
        }
        let added = self.manager.lock().merge(batch);
        debug!(added, "history reconciled");
    }

    fn set_state(&self, state: ChannelState) {
        *self.state.lock() = state;
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    webhooks: Vec<HistoryRecord>,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    data: Value,
}
