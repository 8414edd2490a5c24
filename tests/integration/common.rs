//! Shared setup for integration tests

use std::net::SocketAddr;

use axum::Router;
use axum_test::TestServer;
use stride_tracker::api::{create_router, AppState};
use stride_tracker::config::Config;
use stride_tracker::database::DatabaseManager;

/// Nothing listens here; requests to it fail fast with a network error
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9/api";

pub fn test_config(api_base_url: &str) -> Config {
    Config {
        api_base_url: api_base_url.to_string(),
        request_timeout: 5,
        ..Config::default()
    }
}

pub async fn create_test_state(api_base_url: &str) -> AppState {
    let database = DatabaseManager::in_memory().await.unwrap();
    AppState::new(test_config(api_base_url), database.pool.clone()).unwrap()
}

pub async fn create_test_server() -> TestServer {
    create_test_server_with_backend(UNREACHABLE_BACKEND).await
}

pub async fn create_test_server_with_backend(api_base_url: &str) -> TestServer {
    let state = create_test_state(api_base_url).await;
    TestServer::new(create_router(state)).unwrap()
}

/// Serve a router on an ephemeral port
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Stand-in for the remote account backend; returns its base URL
pub async fn spawn_fake_backend(router: Router) -> String {
    let addr = spawn(Router::new().nest("/api", router)).await;
    format!("http://{addr}/api")
}
