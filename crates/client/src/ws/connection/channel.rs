//! The realtime channel: one socket, ordered listeners, capped backoff.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_channel::mpsc::{unbounded, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use wiredesk_shared::RealtimeEvent;

use super::{ConnectionState, ReconnectConfig, RealtimeError};
use crate::ws::handlers::{HandlerRegistry, Subscription};
use crate::ws::transport::{Connector, Frame, Socket, TungsteniteConnector};

/// How a live connection ended.
enum Closed {
    ByCaller,
    Unexpected,
}

/// Cancels the running connection loop. The spawned task is detached and
/// exits on its own once cancelled.
struct LoopHandle {
    cancel: CancellationToken,
}

struct Inner {
    url: String,
    connector: Arc<dyn Connector>,
    reconnect_config: ReconnectConfig,
    state: watch::Sender<ConnectionState>,
    handlers: HandlerRegistry,
    /// Feeds the write half of the live socket. `None` while not connected.
    outbound: Mutex<Option<UnboundedSender<String>>>,
    running: Mutex<Option<LoopHandle>>,
}

/// Client side of the realtime socket.
///
/// Cloning is cheap and every clone drives the same connection. Handlers are
/// stored on the channel rather than on a particular connection, so they keep
/// receiving events across reconnects.
///
/// `connect()` while a loop is already connecting, connected or waiting to
/// reconnect is ignored; only one connection exists at a time.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<Inner>,
}

impl RealtimeChannel {
    pub fn new(
        url: impl Into<String>,
        reconnect_config: ReconnectConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                connector,
                reconnect_config,
                state,
                handlers: HandlerRegistry::default(),
                outbound: Mutex::new(None),
                running: Mutex::new(None),
            }),
        }
    }

    /// Channel backed by a real WebSocket.
    pub fn with_tungstenite(url: impl Into<String>, reconnect_config: ReconnectConfig) -> Self {
        Self::new(url, reconnect_config, Arc::new(TungsteniteConnector))
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// Register a handler for every parsed inbound event.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        self.inner.handlers.add(Arc::new(handler))
    }

    /// Start the connection loop. Must be called inside a tokio runtime.
    pub fn connect(&self) {
        let mut running = lock(&self.inner.running);
        let current = self.state();
        if current.is_active() {
            crate::log_debug!("connect() ignored; channel is {:?}", current);
            return;
        }

        let cancel = CancellationToken::new();
        self.inner.state.send_replace(ConnectionState::Connecting);
        crate::log_info!("Connecting realtime channel to {}", self.inner.url);
        tokio::spawn(run(Arc::clone(&self.inner), cancel.clone()));
        *running = Some(LoopHandle { cancel });
    }

    /// Close the connection on purpose. No reconnect follows.
    pub fn disconnect(&self) {
        let mut running = lock(&self.inner.running);
        if let Some(handle) = running.take() {
            handle.cancel.cancel();
            crate::log_info!("Realtime channel to {} disconnected", self.inner.url);
        }
        lock(&self.inner.outbound).take();
        self.inner.state.send_replace(ConnectionState::Disconnected);
    }

    /// Serialize and transmit. Reports `NotConnected` instead of queueing
    /// when the socket is not open.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), RealtimeError> {
        if !self.state().is_connected() {
            crate::log_warn!("Realtime channel is not connected; message dropped");
            return Err(RealtimeError::NotConnected);
        }
        let json =
            serde_json::to_string(message).map_err(|e| RealtimeError::Serialize(e.to_string()))?;
        let outbound = lock(&self.inner.outbound);
        let Some(sender) = outbound.as_ref() else {
            crate::log_warn!("Realtime channel is not connected; message dropped");
            return Err(RealtimeError::NotConnected);
        };
        sender
            .unbounded_send(json)
            .map_err(|_| RealtimeError::NotConnected)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    /// Publish a state unless this loop has been cancelled. Serialized with
    /// `disconnect()` through the `running` lock so a stale loop cannot
    /// overwrite `Disconnected`.
    fn set_state(&self, cancel: &CancellationToken, state: ConnectionState) {
        let _running = lock(&self.running);
        if !cancel.is_cancelled() {
            self.state.send_replace(state);
        }
    }

    fn handle_text(&self, text: &str) {
        match RealtimeEvent::parse(text) {
            Ok(event) => {
                crate::log_debug!("Realtime event `{}` received", event.kind());
                self.handlers.dispatch(&event);
            }
            Err(e) => crate::log_warn!("Dropping realtime frame: {}", e),
        }
    }

    async fn pump(&self, socket: Socket, cancel: &CancellationToken) -> Closed {
        let Socket {
            mut sink,
            mut stream,
        } = socket;
        let (sender, mut receiver) = unbounded::<String>();
        *lock(&self.outbound) = Some(sender);

        let closed = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Err(e) = sink.close().await {
                        crate::log_debug!("Error closing socket: {}", e);
                    }
                    break Closed::ByCaller;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Frame::Text(text))) => self.handle_text(&text),
                    Some(Ok(Frame::Close)) | None => {
                        crate::log_info!("Realtime socket to {} received close", self.url);
                        break Closed::Unexpected;
                    }
                    Some(Err(e)) => {
                        crate::log_error!("Realtime read error: {}", e);
                        break Closed::Unexpected;
                    }
                },
                Some(json) = receiver.next() => {
                    crate::log_debug!("Sending to {}: {}", self.url, json);
                    if let Err(e) = sink.send(json).await {
                        crate::log_error!("Send failed: {}", e);
                        break Closed::Unexpected;
                    }
                }
            }
        };

        let mut outbound = lock(&self.outbound);
        if outbound
            .as_ref()
            .is_some_and(|sender| sender.is_connected_to(&receiver))
        {
            *outbound = None;
        }
        closed
    }
}

async fn run(inner: Arc<Inner>, cancel: CancellationToken) {
    let mut attempt = 0u32;

    loop {
        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            result = inner.connector.connect(&inner.url) => result,
        };

        match connected {
            Ok(socket) => {
                attempt = 0;
                inner.set_state(&cancel, ConnectionState::Connected);
                crate::log_info!("Realtime channel connected to {}", inner.url);

                match inner.pump(socket, &cancel).await {
                    Closed::ByCaller => return,
                    Closed::Unexpected => {
                        crate::log_warn!("Realtime connection to {} lost", inner.url)
                    }
                }
            }
            Err(e) => crate::log_error!("Realtime connection to {} failed: {}", inner.url, e),
        }

        if cancel.is_cancelled() {
            return;
        }

        attempt += 1;
        let Some(delay) = inner.reconnect_config.delay_for_attempt(attempt) else {
            let reason = format!(
                "Max reconnect attempts ({}) exceeded",
                inner.reconnect_config.max_attempts
            );
            crate::log_error!("Realtime channel to {}: {}", inner.url, reason);
            inner.set_state(&cancel, ConnectionState::Failed { reason });
            return;
        };

        crate::log_info!(
            "Reconnecting to {} in {}ms (attempt {}/{})",
            inner.url,
            delay.as_millis(),
            attempt,
            inner.reconnect_config.max_attempts
        );
        inner.set_state(&cancel, ConnectionState::Reconnecting { attempt });

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
