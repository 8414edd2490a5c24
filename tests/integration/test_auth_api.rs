use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::common::{create_test_server, create_test_server_with_backend, spawn_fake_backend};

const PASSWORD: &str = "Secr3t!pass";

/// Accepts `PASSWORD` for any account, rejects everything else
async fn fake_account_backend() -> String {
    let router = Router::new()
        .route(
            "/account/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == PASSWORD {
                    (StatusCode::OK, Json(json!({ "token": "login-token" })))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" })))
                }
            }),
        )
        .route(
            "/account/register",
            post(|Json(body): Json<Value>| async move {
                assert!(body.get("firstName").is_some());
                Json(json!({ "token": "register-token" }))
            }),
        );
    spawn_fake_backend(router).await
}

fn registration(email: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "password": PASSWORD
    })
}

#[tokio::test]
async fn test_register_logout_login_cycle() {
    let server = create_test_server_with_backend(&fake_account_backend().await).await;

    let response = server.post("/api/auth/register").json(&registration("ada@example.com")).await;
    response.assert_status(StatusCode::CREATED);
    let user: Value = response.json();
    assert_eq!(user["email"], "ada@example.com");

    let current: Value = server.get("/api/auth/user").await.json();
    assert_eq!(current["id"], user["id"]);

    server.post("/api/auth/logout").await.assert_status(StatusCode::NO_CONTENT);
    let current: Value = server.get("/api/auth/user").await.json();
    assert!(current.is_null());

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    let logged_in: Value = response.json();
    assert_eq!(logged_in["id"], user["id"]);

    let current: Value = server.get("/api/auth/user").await.json();
    assert_eq!(current["email"], "ada@example.com");
}

#[tokio::test]
async fn test_rejected_login_is_unauthorized() {
    let server = create_test_server_with_backend(&fake_account_backend().await).await;
    server.post("/api/auth/register").json(&registration("ada@example.com")).await;
    server.post("/api/auth/logout").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": "Wr0ng!pass" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let current: Value = server.get("/api/auth/user").await.json();
    assert!(current.is_null());
}

#[tokio::test]
async fn test_login_without_local_account_conflicts() {
    let server = create_test_server_with_backend(&fake_account_backend().await).await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "grace@example.com", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let current: Value = server.get("/api/auth/user").await.json();
    assert!(current.is_null());
}

#[tokio::test]
async fn test_invalid_login_form_never_reaches_backend() {
    let server = create_test_server().await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "not-an-email", "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let server = create_test_server().await;

    let response = server.post("/api/auth/register").json(&registration("ada@example.com")).await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_validate_login_form() {
    let server = create_test_server().await;

    let state: Value = server
        .post("/api/auth/validate/login")
        .json(&json!({ "email": "ada@example", "password": "" }))
        .await
        .json();
    assert_eq!(state["email_error"], "invalid_email");
    assert_eq!(state["password_error"], "empty_password");
    assert_eq!(state["is_data_valid"], false);

    let state: Value = server
        .post("/api/auth/validate/login")
        .json(&json!({ "email": "ada@example.com", "password": "x" }))
        .await
        .json();
    assert!(state["email_error"].is_null());
    assert_eq!(state["is_data_valid"], true);
}

#[tokio::test]
async fn test_validate_register_form() {
    let server = create_test_server().await;

    let state: Value = server
        .post("/api/auth/validate/register")
        .json(&json!({
            "first_name": "Ada",
            "email": "ada@example.com",
            "password": "password",
            "confirm_password": "different"
        }))
        .await
        .json();
    assert_eq!(state["last_name_error"], "required");
    assert_eq!(state["password_error"], "weak_password");
    assert_eq!(state["confirm_password_error"], "password_mismatch");
    assert_eq!(state["is_data_valid"], false);

    let state: Value = server
        .post("/api/auth/validate/register")
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "password": PASSWORD,
            "confirm_password": PASSWORD
        }))
        .await
        .json();
    assert_eq!(state["is_data_valid"], true);
}
