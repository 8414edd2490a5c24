//! Authentication API Endpoints
//!
//! Login, registration and logout, plus live form validation so a client
//! can show field errors while the user types.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::auth_forms::{login_data_changed, register_data_changed, LoginFormState, RegisterFormState};
use crate::models::user::User;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/user", get(current_user))
        .route("/auth/validate/login", post(validate_login))
        .route("/auth/validate/register", post(validate_register))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterFormRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> AppResult<Json<User>> {
    Ok(Json(state.auth.login(&request.email, &request.password).await?))
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state
        .auth
        .register(&request.first_name, &request.last_name, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn logout(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.auth.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_user(State(state): State<AppState>) -> AppResult<Json<Option<User>>> {
    Ok(Json(state.auth.current_user().await?))
}

pub async fn validate_login(Json(request): Json<LoginRequest>) -> Json<LoginFormState> {
    Json(login_data_changed(&request.email, &request.password))
}

pub async fn validate_register(Json(request): Json<RegisterFormRequest>) -> Json<RegisterFormState> {
    Json(register_data_changed(
        &request.first_name,
        &request.last_name,
        &request.email,
        &request.password,
        &request.confirm_password,
    ))
}
