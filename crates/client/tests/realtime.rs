mod common;

use std::time::Duration;

use common::{signed_in, spawn_server, wait_for_state};
use serde_json::json;
use wiredesk_client::ws::{ConnectionState, RealtimeChannel, RealtimeError, ReconnectConfig};
use wiredesk_shared::RealtimeEvent;

#[tokio::test]
async fn server_acknowledges_client_messages() {
    let addr = spawn_server(None).await;
    let (app, _) = signed_in(addr, "ack@example.com").await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let subscription = app.channel.on_message(move |event: &RealtimeEvent| {
        let _ = tx.send(event.clone());
    });

    app.channel.connect();
    wait_for_state(&app, ConnectionState::is_connected).await;
    app.channel.send(&json!({ "type": "ping" })).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.kind(), "ack");

    assert!(subscription.unsubscribe());
    app.channel.disconnect();
    assert_eq!(
        app.channel.send(&json!({ "type": "ping" })),
        Err(RealtimeError::NotConnected)
    );
}

#[tokio::test]
async fn unreachable_server_ends_in_failed() {
    // Bind and drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let channel = RealtimeChannel::with_tungstenite(
        format!("ws://{addr}/ws"),
        ReconnectConfig {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
        },
    );
    let mut states = channel.subscribe_state();
    channel.connect();

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|s| matches!(s, ConnectionState::Failed { .. })),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert!(matches!(state, ConnectionState::Failed { .. }));
}
