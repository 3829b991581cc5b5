//! WebSocket listener for admin order notifications
//!
//! One background task owns the connection and forwards decoded
//! [`LiveEvent`]s over an mpsc channel. Its lifecycle is published through a
//! `watch` channel: `Connecting -> Open -> Closed`, with `Closed` reachable from
//! either state. After an unexpected close the task reconnects with
//! exponential backoff unless reconnection is disabled; an explicit
//! [`LiveListener::close`] always ends it for good.

use futures_util::{SinkExt, StreamExt};
use labdash_core::LiveEvent;
use labdash_core::config::LiveConfig;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument, warn};

/// Connection lifecycle of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Receiving events
    Open,
    /// Not connected; terminal once the listener is closed
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Doubling reconnect delay with an upper bound
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Start at `initial`, never exceed `max`
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial.min(max),
        }
    }

    /// Delay before the next attempt; doubles the following one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Back to the initial delay after a successful connection
    pub fn reset(&mut self) {
        self.current = self.initial.min(self.max);
    }
}

enum SessionEnd {
    Shutdown,
    Disconnected,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle to the background connection task
pub struct LiveListener {
    url: String,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: broadcast::Sender<()>,
    closed: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for LiveListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveListener")
            .field("url", &self.url)
            .field("state", &self.state())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl LiveListener {
    /// Start listening on `config.endpoint()`, forwarding events to `events`
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(config: &LiveConfig, events: mpsc::Sender<LiveEvent>) -> Self {
        let url = config.endpoint();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let worker = Worker {
            url: url.clone(),
            reconnect: config.reconnect,
            backoff: Backoff::new(config.reconnect_initial(), config.reconnect_max()),
            events,
            state_tx,
            shutdown_rx,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            url,
            state_rx,
            shutdown_tx,
            closed: AtomicBool::new(false),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state change
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Whether [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the channel and wait for the task to finish
    ///
    /// Only the first call does anything.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Listener already closed");
            return;
        }

        // The task may already have exited on its own
        let _ = self.shutdown_tx.send(());

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Live listener task ended abnormally");
            }
        }
        info!("Live listener closed");
    }
}

struct Worker {
    url: String,
    reconnect: bool,
    backoff: Backoff,
    events: mpsc::Sender<LiveEvent>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            self.state_tx.send_replace(ConnectionState::Connecting);
            info!(url = %self.url, "Connecting to live updates");

            let connected = tokio::select! {
                result = connect_async(self.url.as_str()) => result,
                _ = self.shutdown_rx.recv() => break,
            };

            match connected {
                Ok((stream, _)) => {
                    self.state_tx.send_replace(ConnectionState::Open);
                    self.backoff.reset();
                    info!("Live updates connected");

                    if matches!(self.pump(stream).await, SessionEnd::Shutdown) {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Live update connection failed"),
            }

            self.state_tx.send_replace(ConnectionState::Closed);
            if !self.reconnect {
                info!("Reconnection disabled, live updates stopped");
                break;
            }

            let delay = self.backoff.next_delay();
            debug!(delay = ?delay, "Reconnecting after delay");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = self.shutdown_rx.recv() => break,
            }
        }

        self.state_tx.send_replace(ConnectionState::Closed);
    }

    async fn pump(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        loop {
            let message = tokio::select! {
                message = read.next() => message,
                _ = self.shutdown_rx.recv() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "Close frame not delivered");
                    }
                    return SessionEnd::Shutdown;
                }
            };

            match message {
                Some(Ok(Message::Text(text))) => match LiveEvent::decode(&text) {
                    Ok(Some(event)) => {
                        debug!(kind = event.kind(), "Live event received");
                        tokio::select! {
                            sent = self.events.send(event) => {
                                if sent.is_err() {
                                    debug!("Event consumer gone");
                                    return SessionEnd::Shutdown;
                                }
                            }
                            _ = self.shutdown_rx.recv() => return SessionEnd::Shutdown,
                        }
                    }
                    Ok(None) => debug!(frame = %text, "Ignoring unrecognized event type"),
                    Err(e) => warn!(error = %e, "Failed to parse live event"),
                },
                Some(Ok(Message::Close(_))) => {
                    info!("Live update connection closed by server");
                    return SessionEnd::Disconnected;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Live update connection error");
                    return SessionEnd::Disconnected;
                }
                None => return SessionEnd::Disconnected,
            }
        }
    }
}
