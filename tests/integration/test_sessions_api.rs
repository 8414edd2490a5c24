use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_test::TestServer;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use serde_json::{json, Value};

use super::common::{create_test_server, create_test_server_with_backend, spawn_fake_backend};

/// Record a finished workout along a meridian, one fix per latitude
async fn record_workout(server: &TestServer, name: &str, latitudes: &[f64]) -> i64 {
    let session: Value = server
        .post("/api/workout/start")
        .json(&json!({ "name": name }))
        .await
        .json();

    for latitude in latitudes {
        server
            .post("/api/workout/fix")
            .json(&json!({ "latitude": latitude, "longitude": 18.0 }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    server.post("/api/workout/stop").await.assert_status_ok();
    session["id"].as_i64().unwrap()
}

fn names(sessions: &Value) -> Vec<&str> {
    sessions
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_sessions_sorted_by_distance() {
    let server = create_test_server().await;
    record_workout(&server, "short", &[59.0, 59.001]).await;
    record_workout(&server, "long", &[59.0, 59.01]).await;
    record_workout(&server, "medium", &[59.0, 59.005]).await;

    let sessions: Value = server
        .get("/api/sessions")
        .add_query_param("sort", "distance")
        .add_query_param("order", "asc")
        .await
        .json();
    assert_eq!(names(&sessions), vec!["short", "medium", "long"]);

    let sessions: Value = server
        .get("/api/sessions")
        .add_query_param("sort", "distance")
        .add_query_param("order", "desc")
        .await
        .json();
    assert_eq!(names(&sessions), vec!["long", "medium", "short"]);
}

#[tokio::test]
async fn test_list_sessions_rejects_unknown_sort() {
    let server = create_test_server().await;

    let response = server.get("/api/sessions").add_query_param("sort", "calories").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_stats() {
    let server = create_test_server().await;

    let stats: Value = server.get("/api/sessions/stats").await.json();
    assert_eq!(stats["session_count"], 0);
    assert!(stats["average_distance_m"].is_null());

    record_workout(&server, "a", &[59.0, 59.001]).await;
    record_workout(&server, "b", &[59.0, 59.003]).await;

    let stats: Value = server.get("/api/sessions/stats").await.json();
    assert_eq!(stats["session_count"], 2);
    let total = stats["total_distance_m"].as_f64().unwrap();
    assert!((total - 444.8).abs() < 2.0, "total was {total}");
}

#[tokio::test]
async fn test_edit_session() {
    let server = create_test_server().await;
    let id = record_workout(&server, "Run", &[59.0]).await;

    let updated: Value = server
        .put(&format!("/api/sessions/{id}"))
        .json(&json!({ "name": "Evening run" }))
        .await
        .json();
    assert_eq!(updated["name"], "Evening run");
    assert_eq!(updated["description"], "");

    let fetched: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(fetched["name"], "Evening run");

    server
        .put(&format!("/api/sessions/{id}"))
        .json(&json!({ "name": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_session_removes_points() {
    let server = create_test_server().await;
    let id = record_workout(&server, "Run", &[59.0, 59.001]).await;

    let points: Value = server.get(&format!("/api/sessions/{id}/points")).await.json();
    assert_eq!(points.as_array().unwrap().len(), 2);

    server
        .delete(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/sessions/{id}/points"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_active_session_cannot_be_deleted() {
    let server = create_test_server().await;
    let session: Value = server.post("/api/workout/start").json(&json!({})).await.json();
    let id = session["id"].as_i64().unwrap();

    server
        .delete(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_gpx_download() {
    let server = create_test_server().await;
    let id = record_workout(&server, "Trail <loop>", &[59.0, 59.5]).await;

    let response = server.get(&format!("/api/sessions/{id}/gpx")).await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/gpx+xml");
    assert_eq!(
        response.header("content-disposition"),
        format!("attachment; filename=\"session-{id}.gpx\"").as_str()
    );

    let gpx = response.text();
    assert!(gpx.starts_with("<?xml"));
    assert!(gpx.contains("<name>Trail &lt;loop&gt;</name>"));
    assert_eq!(gpx.matches("<trkpt").count(), 2);
    assert!(gpx.find("lat=\"59\"").unwrap() < gpx.find("lat=\"59.5\"").unwrap());
}

#[tokio::test]
async fn test_upload_requires_login() {
    let server = create_test_server().await;
    let id = record_workout(&server, "Run", &[59.0]).await;

    server
        .post(&format!("/api/sessions/{id}/upload"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_stores_remote_id() {
    let backend = Router::new()
        .route(
            "/account/register",
            post(|| async { Json(json!({ "token": "tok-1" })) }),
        )
        .route("/sessions", post(|| async { Json(json!({ "id": "remote-42" })) }))
        .route(
            "/sessions/:id/locations",
            post(|| async { StatusCode::CREATED }),
        );
    let base_url = spawn_fake_backend(backend).await;
    let server = create_test_server_with_backend(&base_url).await;

    server
        .post("/api/auth/register")
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": "Secr3t!pass"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let id = record_workout(&server, "Run", &[59.0, 59.001]).await;

    let uploaded: Value = server.post(&format!("/api/sessions/{id}/upload")).await.json();
    assert_eq!(uploaded["remote_id"], "remote-42");

    let fetched: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(fetched["remote_id"], "remote-42");

    server
        .post(&format!("/api/sessions/{id}/upload"))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_failed_points_upload_is_retried_alone() {
    let created = Arc::new(AtomicUsize::new(0));
    let points_fail = Arc::new(AtomicBool::new(true));

    let backend = Router::new()
        .route(
            "/account/register",
            post(|| async { Json(json!({ "token": "tok-1" })) }),
        )
        .route(
            "/sessions",
            post({
                let created = created.clone();
                move || async move {
                    created.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "id": "remote-7" }))
                }
            }),
        )
        .route(
            "/sessions/:id/locations",
            post({
                let points_fail = points_fail.clone();
                move || async move {
                    if points_fail.load(Ordering::SeqCst) {
                        StatusCode::INTERNAL_SERVER_ERROR
                    } else {
                        StatusCode::CREATED
                    }
                }
            }),
        );
    let server = create_test_server_with_backend(&spawn_fake_backend(backend).await).await;

    server
        .post("/api/auth/register")
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": "Secr3t!pass"
        }))
        .await
        .assert_status(StatusCode::CREATED);
    let id = record_workout(&server, "Run", &[59.0, 59.001]).await;

    server
        .post(&format!("/api/sessions/{id}/upload"))
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
    let fetched: Value = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(fetched["remote_id"], "remote-7");
    assert_eq!(fetched["points_uploaded"], false);

    points_fail.store(false, Ordering::SeqCst);
    let uploaded: Value = server.post(&format!("/api/sessions/{id}/upload")).await.json();
    assert_eq!(uploaded["remote_id"], "remote-7");
    assert_eq!(uploaded["points_uploaded"], true);
    assert_eq!(created.load(Ordering::SeqCst), 1);
}
