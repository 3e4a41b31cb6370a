#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_channel::mpsc::{unbounded, UnboundedSender};
use futures_util::SinkExt;

use tokio::net::TcpListener;
use wiredesk_client::storage::{MemoryStorage, Storage};
use wiredesk_client::ws::{
    ConnectionState, Connector, Frame, FrameSink, FrameStream, RealtimeError, ReconnectConfig,
    Socket,
};
use wiredesk_client::{AppContext, ClientConfig};
use wiredesk_server::AppState;
use wiredesk_shared::{RealtimeEvent, ACK};

pub const PASSWORD: &str = "password123";

/// Start the development backend on an ephemeral port.
pub async fn spawn_server(process_delay: Option<Duration>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(wiredesk_server::serve(listener, AppState::new(process_delay)));
    addr
}

pub fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        api_base_url: format!("http://{addr}"),
        ws_base_url: format!("ws://{addr}"),
        reconnect: ReconnectConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
        },
        ..ClientConfig::default()
    }
}

/// Connector that hands out one in-process socket. Frames pushed into the
/// returned sender arrive at the channel as if the server had sent them.
pub struct ScriptedConnector {
    socket: Mutex<Option<Socket>>,
}

impl ScriptedConnector {
    pub fn new() -> (Arc<Self>, UnboundedSender<Result<Frame, RealtimeError>>) {
        let (in_tx, in_rx) = unbounded::<Result<Frame, RealtimeError>>();
        let (out_tx, _out_rx) = unbounded::<String>();
        let sink: FrameSink = Box::pin(out_tx.sink_map_err(|e| RealtimeError::Io(e.to_string())));
        let stream: FrameStream = Box::pin(in_rx);
        let connector = Arc::new(Self {
            socket: Mutex::new(Some(Socket { sink, stream })),
        });
        (connector, in_tx)
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<Socket, RealtimeError> {
        self.socket
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| RealtimeError::Connect("connection refused".to_string()))
    }
}

/// Signed-in context whose realtime channel runs over `connector`.
pub async fn signed_in_with_connector(
    addr: SocketAddr,
    email: &str,
    connector: Arc<dyn Connector>,
) -> AppContext {
    let storage = Arc::new(MemoryStorage::new());
    let app = AppContext::with_connector(config_for(addr), storage, connector).unwrap();
    let auth = app.auth();
    let _ = auth.register(email, PASSWORD).await;
    auth.login(email, PASSWORD).await.unwrap();
    app
}

pub fn app_with_storage(addr: SocketAddr, storage: Arc<dyn Storage>) -> AppContext {
    AppContext::new(config_for(addr), storage).unwrap()
}

/// Register `email` and sign in with a fresh in-memory store.
pub async fn signed_in(addr: SocketAddr, email: &str) -> (AppContext, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let app = app_with_storage(addr, storage.clone());
    let auth = app.auth();
    if auth.register(email, PASSWORD).await.is_err() {
        // Already registered by an earlier client in the same test.
    }
    auth.login(email, PASSWORD).await.unwrap();
    (app, storage)
}

pub async fn wait_for_state(app: &AppContext, pred: impl FnMut(&ConnectionState) -> bool) {
    let mut rx = app.channel.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for channel state")
        .unwrap();
}

/// Round-trip a message so the server side of the socket is known to be
/// subscribed to broadcasts.
pub async fn await_ack(app: &AppContext) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let subscription = app.channel.on_message(move |event: &RealtimeEvent| {
        if event.kind() == ACK {
            let _ = tx.send(());
        }
    });
    app.channel
        .send(&serde_json::json!({ "type": "ping" }))
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no ack from server");
    subscription.unsubscribe();
}
