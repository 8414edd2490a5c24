use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::common::create_test_server;

#[tokio::test]
async fn test_get_timer_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/api/timer").await;
    response.assert_status_ok();

    let timer: Value = response.json();
    assert_eq!(timer["total"], 0);
    assert_eq!(timer["checkpoint"], 0);
    assert_eq!(timer["waypoint"], 0);
    assert_eq!(timer["total_running"], false);
}

#[tokio::test]
async fn test_start_and_stop_total_timer() {
    let server = create_test_server().await;

    let response = server.post("/api/timer/total/start").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["changed"], true);
    assert_eq!(body["timer"]["total_running"], true);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let timer: Value = server.get("/api/timer").await.json();
    assert!(timer["total"].as_u64().unwrap() > 0);

    let body: Value = server.post("/api/timer/total/stop").await.json();
    assert_eq!(body["changed"], true);
    assert_eq!(body["timer"]["total_running"], false);
    assert_eq!(body["timer"]["total"], 0);
}

#[tokio::test]
async fn test_second_start_is_reported_unchanged() {
    let server = create_test_server().await;

    server.post("/api/timer/total/start").await.assert_status_ok();
    let body: Value = server.post("/api/timer/total/start").await.json();

    assert_eq!(body["changed"], false);
    assert_eq!(body["timer"]["total_running"], true);
}

#[tokio::test]
async fn test_nested_timer_requires_running_total() {
    let server = create_test_server().await;

    let body: Value = server.post("/api/timer/checkpoint/start").await.json();
    assert_eq!(body["changed"], false);
    assert_eq!(body["timer"]["checkpoint_running"], false);

    server.post("/api/timer/total/start").await.assert_status_ok();
    let body: Value = server.post("/api/timer/checkpoint/start").await.json();
    assert_eq!(body["changed"], true);
    assert_eq!(body["timer"]["checkpoint_running"], true);

    let body: Value = server.post("/api/timer/checkpoint/stop").await.json();
    assert_eq!(body["changed"], true);
    assert_eq!(body["timer"]["checkpoint_running"], false);
    assert_eq!(body["timer"]["total_running"], true);
}

#[tokio::test]
async fn test_total_timer_belongs_to_active_workout() {
    let server = create_test_server().await;
    server
        .post("/api/workout/start")
        .json(&json!({ "name": "Run" }))
        .await
        .assert_status(StatusCode::CREATED);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = server.post("/api/timer/total/stop").await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "TimerError");

    server.post("/api/timer/total/start").await.assert_status(StatusCode::CONFLICT);
    let body: Value = server.post("/api/timer/checkpoint/start").await.json();
    assert_eq!(body["changed"], true);

    let timer: Value = server.get("/api/timer").await.json();
    assert_eq!(timer["total_running"], true);

    let session: Value = server.post("/api/workout/stop").await.json();
    assert!(session["duration_ms"].as_i64().unwrap() >= 50);

    let body: Value = server.post("/api/timer/total/start").await.json();
    assert_eq!(body["changed"], true);
}

#[tokio::test]
async fn test_unknown_timer_is_rejected() {
    let server = create_test_server().await;

    let response = server.post("/api/timer/lap/start").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let server = create_test_server().await;

    let response = server.post("/api/timer/total/reset").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_dashboard_renders_counters() {
    let server = create_test_server().await;

    let dashboard: Value = server.get("/api/dashboard").await.json();
    assert_eq!(dashboard["total"], "00:00:00.000");
    assert_eq!(dashboard["is_tracking"], false);
    assert!(dashboard["last_fix"].is_null());
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/api/health").await;
    response.assert_status_ok();

    let health: Value = response.json();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["timer_running"], false);
    assert_eq!(health["websocket_connections"], 0);
}
