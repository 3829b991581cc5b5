//! Live listener tests against a local WebSocket server

use futures_util::{SinkExt, StreamExt};
use labdash_client::{ConnectionState, LiveListener};
use labdash_core::config::LiveConfig;
use labdash_core::{LiveEvent, LowStockAlert};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

async fn bind() -> (TcpListener, LiveConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = LiveConfig {
        ws_url: format!("ws://{addr}"),
        reconnect_initial_ms: 20,
        reconnect_max_ms: 100,
        ..LiveConfig::default()
    };
    (listener, config)
}

async fn wait_for_state(listener: &LiveListener, state: ConnectionState) {
    let mut changes = listener.state_changes();
    timeout(Duration::from_secs(5), changes.wait_for(|s| *s == state))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_forwards_known_events_and_skips_the_rest() {
    let (server, config) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let frames = [
            r#"{"type": "order_status", "data": {"order_id": 1}}"#.to_string(),
            "definitely not json".to_string(),
            r#"{"type": "order_update", "data": {"order_id": 9, "action": "new_order", "status": "Pending"}}"#.to_string(),
            LiveEvent::LowStockAlert(LowStockAlert::new("Beaker 500ml", 2))
                .to_envelope()
                .to_string(),
        ];
        for frame in frames {
            ws.send(Message::Text(frame)).await.unwrap();
        }
        // Hold the connection until the client goes away
        while ws.next().await.is_some() {}
    });

    let (tx, mut rx) = mpsc::channel(8);
    let listener = LiveListener::spawn(&config, tx);

    let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();

    assert!(matches!(first, LiveEvent::OrderUpdate(ref u) if u.order_id == Some(9)));
    assert_eq!(
        second,
        LiveEvent::LowStockAlert(LowStockAlert::new("Beaker 500ml", 2))
    );
    assert_eq!(listener.state(), ConnectionState::Open);

    listener.close().await;
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (server, config) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while ws.next().await.is_some() {}
    });

    let (tx, _rx) = mpsc::channel(8);
    let listener = LiveListener::spawn(&config, tx);
    wait_for_state(&listener, ConnectionState::Open).await;

    listener.close().await;
    assert_eq!(listener.state(), ConnectionState::Closed);
    assert!(listener.is_closed());

    listener.close().await;
    assert_eq!(listener.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_close_before_connection_opens() {
    let config = LiveConfig {
        ws_url: "ws://127.0.0.1:9".to_string(),
        reconnect_initial_ms: 10_000,
        reconnect_max_ms: 10_000,
        ..LiveConfig::default()
    };

    let (tx, _rx) = mpsc::channel(8);
    let listener = LiveListener::spawn(&config, tx);

    timeout(Duration::from_secs(5), listener.close()).await.unwrap();
    assert_eq!(listener.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let (server, config) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        drop(ws);

        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"type": "order_update"}"#.to_string()))
            .await
            .unwrap();
        while ws.next().await.is_some() {}
    });

    let (tx, mut rx) = mpsc::channel(8);
    let listener = LiveListener::spawn(&config, tx);

    let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(event.kind(), "order_update");

    listener.close().await;
}

#[tokio::test]
async fn test_no_reconnect_when_disabled() {
    let (server, mut config) = bind().await;
    config.reconnect = false;

    let accepted = tokio::spawn(async move {
        let (stream, _) = server.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        drop(ws);

        timeout(Duration::from_millis(300), server.accept()).await.is_ok()
    });

    let (tx, _rx) = mpsc::channel(8);
    let listener = LiveListener::spawn(&config, tx);

    let reconnected = accepted.await.unwrap();
    assert!(!reconnected);
    assert_eq!(listener.state(), ConnectionState::Closed);

    listener.close().await;
}
