use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use pulse_common::models::PriceUpdate;

use crate::{config::FeedClientConfig, session::SessionState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Disposed,
}

fn transition(current: &mut ConnectionState, next: ConnectionState) {
    tracing::trace!(from = ?current, to = ?next, "feed connection state");
    *current = next;
}

/// Reconnecting subscriber to the price feed. A single supervisory task owns
/// the whole lifecycle: connect, drain messages into the session state, and
/// after any closure sleep a fixed delay before the one pending reconnect.
/// Teardown cancels that sleep and closes the socket; nothing outlives the
/// handle.
pub struct FeedSubscriber {
    config: FeedClientConfig,
    state: Arc<RwLock<SessionState>>,
}

pub struct FeedSubscriberHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    state: Arc<RwLock<SessionState>>,
}

impl FeedSubscriber {
    pub fn new(config: FeedClientConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(SessionState::new())),
        }
    }

    /// Shared session state; consumers read snapshots, only the subscriber
    /// task writes.
    pub fn state(&self) -> Arc<RwLock<SessionState>> {
        self.state.clone()
    }

    pub fn spawn(self) -> FeedSubscriberHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = self.state.clone();
        let task = tokio::spawn(self.run(shutdown_rx));

        FeedSubscriberHandle {
            shutdown: shutdown_tx,
            task,
            state,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut conn_state = ConnectionState::Connecting;

        loop {
            tracing::debug!(endpoint = %self.config.endpoint, "connecting to price feed");

            match connect_async(self.config.endpoint.as_str()).await {
                Ok((stream, _)) => {
                    transition(&mut conn_state, ConnectionState::Open);
                    tracing::info!("price feed connected");

                    // fresh session per connection
                    self.state.write().reset();

                    let disposed = self.drive_connection(stream, &mut shutdown).await;
                    if disposed {
                        transition(&mut conn_state, ConnectionState::Disposed);
                        break;
                    }
                    transition(&mut conn_state, ConnectionState::Closed);
                    tracing::info!(
                        "price feed disconnected, reconnecting in {:?}",
                        self.config.reconnect_delay
                    );
                }
                Err(e) => {
                    transition(&mut conn_state, ConnectionState::Closed);
                    tracing::error!(
                        "price feed connection failed: {}, retrying in {:?}",
                        e,
                        self.config.reconnect_delay
                    );
                }
            }

            // Exactly one reconnect pending per closure; teardown cancels it.
            tokio::select! {
                _ = time::sleep(self.config.reconnect_delay) => {
                    transition(&mut conn_state, ConnectionState::Connecting);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        transition(&mut conn_state, ConnectionState::Disposed);
                        break;
                    }
                }
            }
        }

        debug_assert_eq!(conn_state, ConnectionState::Disposed);
        tracing::debug!("price feed subscriber disposed");
    }

    /// Pumps one open connection until it closes. Returns true when the exit
    /// was caused by teardown rather than a transport closure.
    async fn drive_connection(
        &self,
        stream: WsStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        let (mut sender, mut receiver) = stream.split();
        let mut sweep = time::interval(self.config.flash_sweep_interval);

        loop {
            tokio::select! {
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_message(text.as_str()),
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sender.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::debug!("price feed channel closed");
                            return false;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            // the stream ends after an error; reconnect is
                            // driven by the closure that follows
                            tracing::error!("price feed stream error: {}", e);
                            return false;
                        }
                    }
                }
                _ = sweep.tick() => {
                    self.state
                        .write()
                        .expire_flashes(Instant::now(), self.config.flash_duration);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let _ = sender.send(Message::Close(None)).await;
                        return true;
                    }
                }
            }
        }
    }

    fn handle_message(&self, text: &str) {
        match serde_json::from_str::<PriceUpdate>(text) {
            Ok(update) => {
                let token_id = update.token_id.clone();
                let raised = self.state.write().apply_update(update, Instant::now());
                if let Some(direction) = raised {
                    tracing::debug!(token = %token_id, ?direction, "price flash");
                }
            }
            Err(e) => {
                // malformed payloads are dropped, the connection stays up
                tracing::error!("failed to parse price update: {}", e);
            }
        }
    }
}

impl FeedSubscriberHandle {
    pub fn state(&self) -> Arc<RwLock<SessionState>> {
        self.state.clone()
    }

    /// Cancels any pending reconnect, closes the channel, and waits for the
    /// supervisory task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
