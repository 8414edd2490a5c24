use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use stride_tracker::api::create_router;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::common::{create_test_state, spawn, UNREACHABLE_BACKEND};

type WsError = tokio_tungstenite::tungstenite::Error;

async fn next_json<S>(receiver: &mut S) -> Value
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let message = timeout(Duration::from_secs(2), receiver.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Skip messages until one satisfies `predicate`
async fn wait_for<S, F>(receiver: &mut S, predicate: F) -> Value
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
    F: Fn(&Value) -> bool,
{
    loop {
        let message = next_json(receiver).await;
        if predicate(&message) {
            return message;
        }
    }
}

async fn start_server() -> (String, stride_tracker::api::AppState) {
    let state = create_test_state(UNREACHABLE_BACKEND).await;
    let addr = spawn(create_router(state.clone())).await;
    (format!("ws://{addr}/ws"), state)
}

#[tokio::test]
async fn test_initial_dashboard_on_connect() {
    let (url, _state) = start_server().await;

    let (stream, _) = connect_async(url.as_str()).await.unwrap();
    let (_sender, mut receiver) = stream.split();

    let message = next_json(&mut receiver).await;
    assert_eq!(message["type"], "dashboard");
    assert_eq!(message["payload"]["total"], "00:00:00.000");
    assert_eq!(message["payload"]["total_running"], false);
}

#[tokio::test]
async fn test_client_commands_are_pushed_back() {
    let (url, _state) = start_server().await;

    let (stream, _) = connect_async(url.as_str()).await.unwrap();
    let (mut sender, mut receiver) = stream.split();
    next_json(&mut receiver).await;

    sender
        .send(Message::Text(json!({ "type": "start_timer", "timer": "total" }).to_string()))
        .await
        .unwrap();

    let running = wait_for(&mut receiver, |m| m["type"] == "dashboard" && m["payload"]["total_running"] == true).await;
    assert_eq!(running["payload"]["checkpoint_running"], false);

    sender
        .send(Message::Text(json!({ "type": "stop_timer", "timer": "total" }).to_string()))
        .await
        .unwrap();

    let ended = wait_for(&mut receiver, |m| m["type"] == "session_ended").await;
    assert!(ended["elapsed_ms"].is_u64());
}

#[tokio::test]
async fn test_http_changes_reach_every_client() {
    let (url, state) = start_server().await;

    let (first, _) = connect_async(url.as_str()).await.unwrap();
    let (second, _) = connect_async(url.as_str()).await.unwrap();
    let (_first_sender, mut first_rx) = first.split();
    let (_second_sender, mut second_rx) = second.split();
    next_json(&mut first_rx).await;
    next_json(&mut second_rx).await;

    state.workouts.start("Run", "").await.unwrap();

    for receiver in [&mut first_rx, &mut second_rx] {
        let message = wait_for(receiver, |m| {
            m["type"] == "dashboard" && m["payload"]["is_tracking"] == true && m["payload"]["total_running"] == true
        })
        .await;
        assert!(message["payload"]["active_session_id"].is_i64());
    }

    assert_eq!(state.websocket.connection_count(), 2);
}

#[tokio::test]
async fn test_ping_and_invalid_message() {
    let (url, _state) = start_server().await;

    let (stream, _) = connect_async(url.as_str()).await.unwrap();
    let (mut sender, mut receiver) = stream.split();
    next_json(&mut receiver).await;

    sender
        .send(Message::Text(json!({ "type": "ping" }).to_string()))
        .await
        .unwrap();
    wait_for(&mut receiver, |m| m["type"] == "pong").await;

    sender.send(Message::Text("{not json".to_string())).await.unwrap();
    let error = wait_for(&mut receiver, |m| m["type"] == "error").await;
    assert!(error["message"].as_str().unwrap().starts_with("Invalid message"));
}
