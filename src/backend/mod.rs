//! Remote gateway client
//!
//! A lazily-constructed, environment-configured handle to the
//! backend-as-a-service endpoint (database API, auth, object storage).
//! The handle is explicit about its two states: `Enabled` wraps live
//! API facades, `Disabled` is the safe no-op every call site must
//! pattern-match on. Nothing in this module throws on missing
//! configuration.

pub mod auth;
pub mod rest;
pub mod storage;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::BackendConfig;
use crate::data::{Session, User};
use crate::error::Result;

pub use rest::Query;

/// Auth state change pushed from the auth subsystem
///
/// Delivered on a broadcast channel so the session controller can react
/// independently of any direct call.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Database API facade (PostgREST-style `/rest/v1` interface)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestApi: Send + Sync {
    /// Fetch rows matching the query
    async fn select(&self, table: &str, query: Query) -> Result<Vec<Value>>;

    /// Insert one row, returning its representation
    async fn insert(&self, table: &str, body: Value) -> Result<Value>;

    /// Insert-or-merge one row keyed on `on_conflict`, returning its
    /// representation
    async fn upsert(&self, table: &str, body: Value, on_conflict: &str) -> Result<Value>;

    /// Update rows matching the query, returning the first updated row
    async fn update(&self, table: &str, query: Query, body: Value) -> Result<Value>;

    /// Delete rows matching the query
    async fn delete(&self, table: &str, query: Query) -> Result<()>;

    /// Call a stored procedure
    async fn rpc(&self, function: &str, args: Value) -> Result<Value>;
}

/// Auth service facade (GoTrue-style `/auth/v1` interface)
///
/// Holds the live session internally and publishes [`AuthEvent`]s on every
/// sign-in/sign-out transition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Password sign-in; on success the session is stored and a
    /// `SignedIn` event is published
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Registration; a confirmation email may be sent depending on the
    /// backend's settings
    async fn sign_up(&self, email: &str, password: &str) -> Result<()>;

    /// Sign out: the stored session is cleared before the remote call,
    /// and a `SignedOut` event is published regardless of its outcome
    async fn sign_out(&self) -> Result<()>;

    /// Current principal from the stored session, if any
    ///
    /// Expired sessions are dropped eagerly and read as signed-out.
    async fn current_user(&self) -> Result<Option<User>>;

    /// Adopt a previously persisted session after remote validation
    async fn restore(&self, session: Session) -> Result<Option<User>>;

    /// Request a password recovery email
    async fn reset_password(&self, email: &str) -> Result<()>;

    /// Subscribe to auth state change notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Object storage facade (`/storage/v1` interface)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Upload an object; returns the object key as stored
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String>;

    /// Delete an object
    async fn remove(&self, bucket: &str, key: &str) -> Result<()>;

    /// Public URL for an object key
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Live backend facades sharing one HTTP client and session store
pub struct BackendHandle {
    pub rest: Arc<dyn RestApi>,
    pub auth: Arc<dyn AuthApi>,
    pub storage: Arc<dyn StorageApi>,
}

/// Handle to the backend-as-a-service endpoint
///
/// Constructed at most once per process via [`Backend::shared`]. When the
/// endpoint URL or the public key is missing the handle is `Disabled` and
/// all dependent calls degrade gracefully, returning empty or neutral
/// results rather than raising.
#[derive(Clone)]
pub enum Backend {
    Enabled(Arc<BackendHandle>),
    Disabled,
}

impl Backend {
    /// Construct a backend handle from configuration
    ///
    /// Returns `Disabled` when either required configuration string is
    /// absent or the endpoint URL does not parse. Emits one diagnostic
    /// log line on live construction.
    pub fn from_config(config: &BackendConfig) -> Self {
        let (url, anon_key) = match (&config.url, &config.anon_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => (url, key),
            _ => {
                tracing::warn!(
                    "Backend endpoint or public key not configured; running disabled"
                );
                return Backend::Disabled;
            }
        };

        let base = match url::Url::parse(url) {
            Ok(base) => base,
            Err(error) => {
                tracing::error!(%error, url, "Invalid backend URL; running disabled");
                return Backend::Disabled;
            }
        };

        let http = match reqwest::Client::builder()
            .user_agent("Teekdocs/0.1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
        {
            Ok(http) => http,
            Err(error) => {
                tracing::error!(%error, "Failed to build HTTP client; running disabled");
                return Backend::Disabled;
            }
        };

        // One session store shared by the REST and auth facades: REST
        // requests send the live bearer token when a session exists.
        let session = auth::SessionStore::default();
        let (events, _) = broadcast::channel(16);

        let rest = rest::RemoteRest::new(http.clone(), base.clone(), anon_key.clone(), session.clone());
        let auth = auth::RemoteAuth::new(http.clone(), base.clone(), anon_key.clone(), session.clone(), events);
        let storage = storage::RemoteStorage::new(http, base, anon_key.clone(), session);

        tracing::info!(endpoint = %url, "Backend client initialized");

        Backend::Enabled(Arc::new(BackendHandle {
            rest: Arc::new(rest),
            auth: Arc::new(auth),
            storage: Arc::new(storage),
        }))
    }

    /// Process-wide memoized handle
    ///
    /// Loads configuration on first use; a configuration error degrades to
    /// environment variables, and from there to `Disabled`.
    pub fn shared() -> &'static Backend {
        static SHARED: OnceLock<Backend> = OnceLock::new();
        SHARED.get_or_init(|| {
            let backend_config = match crate::config::AppConfig::load() {
                Ok(app_config) => app_config.backend,
                Err(error) => {
                    tracing::warn!(%error, "Configuration load failed; reading backend settings from environment");
                    BackendConfig::from_env()
                }
            };
            Backend::from_config(&backend_config)
        })
    }

    /// Live facades, or `None` when disabled
    pub fn handle(&self) -> Option<&BackendHandle> {
        match self {
            Backend::Enabled(handle) => Some(handle),
            Backend::Disabled => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Backend::Enabled(_))
    }

    /// Assemble a backend from externally constructed facades (test doubles)
    #[cfg(test)]
    pub(crate) fn from_parts(
        rest: Arc<dyn RestApi>,
        auth: Arc<dyn AuthApi>,
        storage: Arc<dyn StorageApi>,
    ) -> Self {
        Backend::Enabled(Arc::new(BackendHandle {
            rest,
            auth,
            storage,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_yields_disabled_handle() {
        let backend = Backend::from_config(&BackendConfig {
            url: None,
            anon_key: Some("key".to_string()),
        });
        assert!(!backend.is_enabled());
        assert!(backend.handle().is_none());
    }

    #[test]
    fn test_invalid_url_yields_disabled_handle() {
        let backend = Backend::from_config(&BackendConfig {
            url: Some("::not-a-url::".to_string()),
            anon_key: Some("key".to_string()),
        });
        assert!(!backend.is_enabled());
    }

    #[test]
    fn test_complete_config_yields_enabled_handle() {
        let backend = Backend::from_config(&BackendConfig {
            url: Some("https://example.supabase.co".to_string()),
            anon_key: Some("anon-key".to_string()),
        });
        assert!(backend.is_enabled());
    }
}
