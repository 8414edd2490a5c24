//! Authentication Form Validation
//!
//! Field-level validation for the login and registration forms. Errors are
//! reported per field so a client can show them next to the offending input;
//! they are form state, not failures.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use strum::Display;

/// Minimum registration password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(
                r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
            )
            .ok()
        })
        .as_ref()
}

/// Matches passwords with at least one weakness: too short, no digit, no
/// uppercase, no lowercase, or nothing outside `[A-Za-z0-9]`.
fn weak_password_pattern() -> Option<&'static Regex> {
    static WEAK: OnceLock<Option<Regex>> = OnceLock::new();
    WEAK.get_or_init(|| {
        Regex::new(&format!(
            r"^(?:.{{0,{}}}|[^0-9]*|[^A-Z]*|[^a-z]*|[a-zA-Z0-9]*)$",
            MIN_PASSWORD_LENGTH - 1
        ))
        .ok()
    })
    .as_ref()
}

/// A validation problem attached to a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    #[strum(to_string = "Not a valid email address")]
    InvalidEmail,

    #[strum(to_string = "Password must not be empty")]
    EmptyPassword,

    #[strum(to_string = "Password must be at least 8 characters and contain a digit, an uppercase letter, a lowercase letter and a special character")]
    WeakPassword,

    #[strum(to_string = "Passwords do not match")]
    PasswordMismatch,

    #[strum(to_string = "This field is required")]
    Required,
}

/// Login form validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFormState {
    pub email_error: Option<FieldError>,
    pub password_error: Option<FieldError>,
    pub is_data_valid: bool,
}

/// Registration form validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFormState {
    pub first_name_error: Option<FieldError>,
    pub last_name_error: Option<FieldError>,
    pub email_error: Option<FieldError>,
    pub password_error: Option<FieldError>,
    pub confirm_password_error: Option<FieldError>,
    pub is_data_valid: bool,
}

/// Check an email address against the standard address pattern
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|pattern| pattern.is_match(email))
}

/// Whether a password clears every registration strength rule
pub fn is_strong_password(password: &str) -> bool {
    weak_password_pattern().is_some_and(|pattern| !pattern.is_match(password))
}

/// Validate the login form
pub fn login_data_changed(email: &str, password: &str) -> LoginFormState {
    let email_error = (!is_valid_email(email)).then_some(FieldError::InvalidEmail);
    let password_error = password.trim().is_empty().then_some(FieldError::EmptyPassword);

    LoginFormState {
        is_data_valid: email_error.is_none() && password_error.is_none(),
        email_error,
        password_error,
    }
}

/// Validate the registration form
pub fn register_data_changed(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> RegisterFormState {
    let first_name_error = first_name.trim().is_empty().then_some(FieldError::Required);
    let last_name_error = last_name.trim().is_empty().then_some(FieldError::Required);
    let email_error = (!is_valid_email(email)).then_some(FieldError::InvalidEmail);
    let password_error = (!is_strong_password(password)).then_some(FieldError::WeakPassword);
    let confirm_password_error = (password != confirm_password).then_some(FieldError::PasswordMismatch);

    let is_data_valid = first_name_error.is_none()
        && last_name_error.is_none()
        && email_error.is_none()
        && password_error.is_none()
        && confirm_password_error.is_none();

    RegisterFormState {
        first_name_error,
        last_name_error,
        email_error,
        password_error,
        confirm_password_error,
        is_data_valid,
    }
}
