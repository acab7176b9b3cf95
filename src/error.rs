//! Error types for Teekdocs
//!
//! All errors in the crate are converted to `AppError`. Read-path gateways
//! swallow errors into empty/neutral results after logging; only the
//! login/registration boundary and comment creation surface failures to
//! callers as returned errors.

use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the crate. Nothing here is fatal to the hosting process;
/// every failure path returns a value.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Authentication failed with a user-facing (translated) message
    ///
    /// Raised by the login/registration boundary by convention of this
    /// layer; the message is already localized via `auth::messages`.
    #[error("{0}")]
    Auth(String),

    /// The backend rejected a request (validation, permission, conflict)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Object storage error, already mapped to a user-facing message
    #[error("Storage error: {0}")]
    Storage(String),

    /// Local validation error (bad input, never sent to the backend)
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP transport error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The backend handle is disabled (missing endpoint or key)
    #[error("Backend is not configured")]
    BackendDisabled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.into())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
