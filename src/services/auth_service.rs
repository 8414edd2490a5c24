//! Authentication Service
//!
//! Login and registration against the remote backend, mirrored into the
//! local user table and the persisted preferences. At most one request of
//! each kind is in flight: starting a new one aborts the previous.

use std::sync::Arc;

use axum::http::StatusCode;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::warn;

use crate::database::{PreferencesRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::logging::log_authentication_event;
use crate::models::auth_forms::{login_data_changed, register_data_changed, LoginFormState, RegisterFormState};
use crate::models::user::{NewUser, User};
use crate::services::backend_client::{BackendClient, BackendError, RegisterRequest};

/// Login/registration client
#[derive(Debug, Clone)]
pub struct AuthenticationClient {
    backend: BackendClient,
    users: UserRepository,
    preferences: PreferencesRepository,
    pending_login: Arc<Mutex<Option<AbortHandle>>>,
    pending_register: Arc<Mutex<Option<AbortHandle>>>,
}

impl AuthenticationClient {
    pub fn new(backend: BackendClient, users: UserRepository, preferences: PreferencesRepository) -> Self {
        Self {
            backend,
            users,
            preferences,
            pending_login: Arc::new(Mutex::new(None)),
            pending_register: Arc::new(Mutex::new(None)),
        }
    }

    /// Log in and remember the token for the matching local user.
    ///
    /// The user must already exist locally; a remote-only account yields
    /// `UnknownLocalUser` and nothing is persisted.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let form = login_data_changed(email, password);
        if !form.is_data_valid {
            return Err(AppError::Validation(describe_login_errors(&form)));
        }

        let client = self.clone();
        let email = email.trim().to_string();
        let password = password.to_string();
        let task = tokio::spawn(async move { client.perform_login(&email, &password).await });

        Self::track(&self.pending_login, &task).await;
        Self::join(task).await
    }

    async fn perform_login(&self, email: &str, password: &str) -> AppResult<User> {
        let token = self.backend.login(email, password).await.map_err(|e| {
            log_authentication_event("login", email, false);
            match e {
                BackendError::Server { status, message } => {
                    warn!(status, %message, "Backend rejected login");
                    AppError::from(AuthError::LoginFailed)
                }
                other => AppError::from(other),
            }
        })?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::UnknownLocalUser(email.to_string()))?;

        self.preferences.store_login(&token.token, user.id).await?;
        log_authentication_event("login", email, true);
        Ok(user)
    }

    /// Register remotely, then create the local user and remember the token
    pub async fn register(&self, first_name: &str, last_name: &str, email: &str, password: &str) -> AppResult<User> {
        let form = register_data_changed(first_name, last_name, email, password, password);
        if !form.is_data_valid {
            return Err(AppError::Validation(describe_register_errors(&form)));
        }

        let client = self.clone();
        let new_user = NewUser {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
        };
        let password = password.to_string();
        let task = tokio::spawn(async move { client.perform_register(new_user, &password).await });

        Self::track(&self.pending_register, &task).await;
        Self::join(task).await
    }

    async fn perform_register(&self, new_user: NewUser, password: &str) -> AppResult<User> {
        let request = RegisterRequest {
            first_name: &new_user.first_name,
            last_name: &new_user.last_name,
            email: &new_user.email,
            password,
        };

        let token = self.backend.register(&request).await.map_err(|e| {
            log_authentication_event("register", &new_user.email, false);
            match e {
                BackendError::Server { status, message } => {
                    warn!(status, %message, "Backend rejected registration");
                    AppError::from(AuthError::RegistrationFailed)
                }
                other => AppError::from(other),
            }
        })?;

        let user = self.users.insert(&new_user).await?;
        self.preferences.store_login(&token.token, user.id).await?;

        log_authentication_event("register", &user.email, true);
        Ok(user)
    }

    /// Forget the persisted token and user id
    pub async fn logout(&self) -> AppResult<()> {
        let user = self.current_user().await?;
        self.preferences.clear_login().await?;

        if let Some(user) = user {
            log_authentication_event("logout", &user.email, true);
        }
        Ok(())
    }

    /// The locally persisted logged-in user, if any
    pub async fn current_user(&self) -> AppResult<Option<User>> {
        match self.preferences.logged_in_user_id().await? {
            Some(id) => self.users.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// The persisted token, or `NotLoggedIn`
    pub async fn token(&self) -> AppResult<String> {
        self.preferences
            .auth_token()
            .await?
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }

    async fn track(pending: &Mutex<Option<AbortHandle>>, task: &JoinHandle<AppResult<User>>) {
        let mut pending = pending.lock().await;
        if let Some(previous) = pending.replace(task.abort_handle()) {
            previous.abort();
        }
    }

    async fn join(task: JoinHandle<AppResult<User>>) -> AppResult<User> {
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AuthError::Cancelled.into()),
            Err(e) => Err(AppError::Internal(format!("authentication task failed: {e}"))),
        }
    }
}

fn describe_login_errors(form: &LoginFormState) -> String {
    [form.email_error, form.password_error]
        .into_iter()
        .flatten()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_register_errors(form: &RegisterFormState) -> String {
    [
        form.first_name_error,
        form.last_name_error,
        form.email_error,
        form.password_error,
        form.confirm_password_error,
    ]
    .into_iter()
    .flatten()
    .map(|e| e.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Login failed")]
    LoginFailed,

    #[error("Registration failed")]
    RegistrationFailed,

    #[error("No local account for {0}; register on this device first")]
    UnknownLocalUser(String),

    #[error("Request superseded by a newer one")]
    Cancelled,

    #[error("Not logged in")]
    NotLoggedIn,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::LoginFailed | AuthError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            AuthError::RegistrationFailed => StatusCode::BAD_REQUEST,
            AuthError::UnknownLocalUser(_) | AuthError::Cancelled => StatusCode::CONFLICT,
        }
    }
}
