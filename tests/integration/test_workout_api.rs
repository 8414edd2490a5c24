use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::common::create_test_server;

#[tokio::test]
async fn test_full_workout_lifecycle() {
    let server = create_test_server().await;

    let response = server
        .post("/api/workout/start")
        .json(&json!({ "name": "Morning run", "description": "Easy pace" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    let session_id = session["id"].as_i64().unwrap();
    assert_eq!(session["name"], "Morning run");

    let timer: Value = server.get("/api/timer").await.json();
    assert_eq!(timer["total_running"], true);

    for latitude in [59.0, 59.001, 59.002] {
        server
            .post("/api/workout/fix")
            .json(&json!({ "latitude": latitude, "longitude": 18.0 }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = server.post("/api/workout/stop").await;
    response.assert_status_ok();
    let finished: Value = response.json();
    assert_eq!(finished["id"].as_i64().unwrap(), session_id);

    // Two steps of 0.001 degrees of latitude, roughly 222 m
    let distance = finished["distance_m"].as_f64().unwrap();
    assert!((distance - 222.4).abs() < 1.0, "distance was {distance}");
    assert!(finished["duration_ms"].as_i64().unwrap() > 0);

    let timer: Value = server.get("/api/timer").await.json();
    assert_eq!(timer["total_running"], false);

    let current: Value = server.get("/api/workout").await.json();
    assert!(current.is_null());
}

#[tokio::test]
async fn test_start_defaults_the_name() {
    let server = create_test_server().await;

    let session: Value = server.post("/api/workout/start").json(&json!({})).await.json();
    assert_eq!(session["name"], "Workout");
    assert_eq!(session["description"], "");
}

#[tokio::test]
async fn test_second_start_conflicts() {
    let server = create_test_server().await;

    server
        .post("/api/workout/start")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.post("/api/workout/start").json(&json!({})).await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_fix_without_workout_conflicts() {
    let server = create_test_server().await;

    let response = server
        .post("/api/workout/fix")
        .json(&json!({ "latitude": 59.0, "longitude": 18.0 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    server.post("/api/workout/stop").await.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_out_of_range_fix_is_rejected() {
    let server = create_test_server().await;
    server.post("/api/workout/start").json(&json!({})).await;

    let response = server
        .post("/api/workout/fix")
        .json(&json!({ "latitude": 91.0, "longitude": 18.0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkpoint_fix_restarts_checkpoint_timer() {
    let server = create_test_server().await;
    server.post("/api/workout/start").json(&json!({})).await;

    let point: Value = server
        .post("/api/workout/fix")
        .json(&json!({ "latitude": 59.0, "longitude": 18.0, "kind": "checkpoint" }))
        .await
        .json();
    assert_eq!(point["kind"], "checkpoint");

    let timer: Value = server.get("/api/timer").await.json();
    assert_eq!(timer["checkpoint_running"], true);
    assert_eq!(timer["waypoint_running"], false);
}

#[tokio::test]
async fn test_current_location_follows_tracking() {
    let server = create_test_server().await;

    let body: Value = server.get("/api/location/current").await.json();
    assert!(body["location"].is_null());

    server.post("/api/workout/start").json(&json!({})).await;
    server
        .post("/api/workout/fix")
        .json(&json!({ "latitude": 59.5, "longitude": 18.25 }))
        .await;

    let body: Value = server.get("/api/location/current").await.json();
    assert_eq!(body["location"]["latitude"], 59.5);
    assert_eq!(body["location"]["longitude"], 18.25);

    let dashboard: Value = server.get("/api/dashboard").await.json();
    assert_eq!(dashboard["is_tracking"], true);
    assert_eq!(dashboard["last_fix"]["latitude"], 59.5);
}

#[tokio::test]
async fn test_revoked_permission_hides_location() {
    let server = create_test_server().await;
    server.post("/api/workout/start").json(&json!({})).await;
    server
        .post("/api/workout/fix")
        .json(&json!({ "latitude": 59.5, "longitude": 18.25 }))
        .await;

    let body: Value = server
        .put("/api/location/permission")
        .json(&json!({ "granted": false }))
        .await
        .json();
    assert_eq!(body["granted"], false);

    let body: Value = server.get("/api/location/current").await.json();
    assert!(body["location"].is_null());
}
