//! Session/auth controller
//!
//! Owns the process-wide session state: current user, current profile,
//! and the initialization lifecycle. The state is mutated from two
//! sources, direct method calls and the auth event subscription, so it
//! lives behind a mutex; on this multi-threaded runtime the lock is what
//! keeps the two writers from interleaving.
//!
//! Login deliberately does not update state on its return path: the
//! `SignedIn` event published by the auth client is what populates the
//! user and profile. Callers must not assume state is current the moment
//! `login` resolves.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::messages;
use crate::api::Profiles;
use crate::backend::{AuthEvent, Backend};
use crate::config::{AuthConfig, FallbackUser};
use crate::data::{Profile, ProfilePatch, User};
use crate::error::{AppError, Result};
use crate::site::fallback;
use crate::site::session_cache::SessionCache;

/// Placeholder shown when no name source is available
const DEFAULT_DISPLAY_NAME: &str = "User";

/// Initialization lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug)]
struct AuthState {
    lifecycle: Lifecycle,
    user: Option<User>,
    profile: Option<Profile>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            user: None,
            profile: None,
        }
    }
}

/// Process-wide session/auth controller
///
/// Cheap to clone; all clones share one state container.
#[derive(Clone)]
pub struct SessionController {
    backend: Backend,
    profiles: Profiles,
    fallback_users: Arc<Vec<FallbackUser>>,
    cache: Option<SessionCache>,
    state: Arc<Mutex<AuthState>>,
}

impl SessionController {
    pub fn new(backend: Backend, auth_config: &AuthConfig) -> Self {
        let profiles = Profiles::new(backend.clone());
        let cache = auth_config
            .session_cache_path
            .clone()
            .map(SessionCache::new);
        Self {
            backend,
            profiles,
            fallback_users: Arc::new(auth_config.fallback_users.clone()),
            cache,
            state: Arc::new(Mutex::new(AuthState::default())),
        }
    }

    /// One-time initialization
    ///
    /// Restores a cached session if present, fetches the current user and
    /// profile, flips to `Ready`, then subscribes to auth state change
    /// events for the remainder of process life. Idempotent: repeated
    /// calls are no-ops once initialization has started.
    pub async fn initialize(&self) {
        {
            let mut state = self.state.lock().await;
            if state.lifecycle != Lifecycle::Uninitialized {
                return;
            }
            state.lifecycle = Lifecycle::Loading;
        }

        let mut user = None;
        let mut profile = None;

        if let Some(handle) = self.backend.handle() {
            if let Some(cache) = &self.cache {
                if let Some(session) = cache.load() {
                    if let Err(error) = handle.auth.restore(session).await {
                        tracing::warn!(%error, "Cached session could not be restored");
                    }
                }
            }

            match handle.auth.current_user().await {
                Ok(current) => user = current,
                Err(error) => tracing::error!(%error, "Failed to fetch current user"),
            }
            if user.is_some() {
                profile = self.profiles.current().await;
            }
        }

        {
            let mut state = self.state.lock().await;
            state.user = user;
            state.profile = profile;
            state.lifecycle = Lifecycle::Ready;
        }
        tracing::info!("Session controller initialized");

        if let Some(handle) = self.backend.handle() {
            let mut events = handle.auth.subscribe();
            let state = self.state.clone();
            let profiles = self.profiles.clone();
            let cache = self.cache.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(AuthEvent::SignedIn(session)) => {
                            tracing::debug!(user_id = %session.user.id, "Auth event: signed in");
                            if let Some(cache) = &cache {
                                cache.store(&session);
                            }
                            let profile = profiles.current().await;
                            let mut state = state.lock().await;
                            state.user = Some(session.user);
                            state.profile = profile;
                        }
                        Ok(AuthEvent::SignedOut) => {
                            tracing::debug!("Auth event: signed out");
                            if let Some(cache) = &cache {
                                cache.clear();
                            }
                            let mut state = state.lock().await;
                            state.user = None;
                            state.profile = None;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Auth event consumer lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    /// Log in with email and password
    ///
    /// On success the `SignedIn` event (not this call's return path)
    /// updates the controller state. When the auth service is
    /// unreachable, the static fallback allow-list is consulted as a
    /// degraded-mode principal source.
    ///
    /// # Errors
    /// `AppError::Auth` carrying a translated, user-facing message.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        match self.backend.handle() {
            Some(handle) => match handle.auth.sign_in(email, password).await {
                Ok(_session) => Ok(()),
                Err(AppError::Backend(message)) => {
                    tracing::warn!(message, "Login rejected");
                    Err(AppError::Auth(messages::translate(&message)))
                }
                Err(AppError::HttpClient(error)) => {
                    tracing::warn!(%error, "Auth service unreachable; trying fallback credentials");
                    self.fallback_login(email, password).await
                }
                Err(error) => Err(error),
            },
            None => self.fallback_login(email, password).await,
        }
    }

    /// Degraded-mode login against the static allow-list
    ///
    /// No remote session exists here, so state is set directly instead
    /// of through the event path.
    async fn fallback_login(&self, username: &str, password: &str) -> Result<()> {
        match fallback::authenticate(&self.fallback_users, username, password) {
            Some(entry) => {
                let mut state = self.state.lock().await;
                state.user = Some(User {
                    id: format!("fallback:{}", entry.username),
                    email: None,
                    created_at: None,
                });
                state.profile = None;
                Ok(())
            }
            None => Err(AppError::Auth(messages::translate(
                "Invalid login credentials",
            ))),
        }
    }

    /// Register a new account
    ///
    /// # Errors
    /// `AppError::Auth` with a translated message; password confirmation
    /// is checked locally before any remote call.
    pub async fn register(&self, email: &str, password: &str, confirm: &str) -> Result<()> {
        if password != confirm {
            return Err(AppError::Auth("Passwords do not match".to_string()));
        }
        let Some(handle) = self.backend.handle() else {
            return Err(AppError::Auth(messages::translate("Signups not allowed")));
        };
        match handle.auth.sign_up(email, password).await {
            Ok(()) => Ok(()),
            Err(AppError::Backend(message)) => {
                tracing::warn!(message, "Registration rejected");
                Err(AppError::Auth(messages::translate(&message)))
            }
            Err(error) => Err(error),
        }
    }

    /// Request a password recovery email
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        let Some(handle) = self.backend.handle() else {
            return Err(AppError::BackendDisabled);
        };
        match handle.auth.reset_password(email).await {
            Ok(()) => Ok(()),
            Err(AppError::Backend(message)) => {
                Err(AppError::Auth(messages::translate(&message)))
            }
            Err(error) => Err(error),
        }
    }

    /// Log out
    ///
    /// Client-authoritative: local state and the persisted cache are
    /// cleared first; a failed remote sign-out must not repopulate them.
    pub async fn logout(&self) {
        {
            let mut state = self.state.lock().await;
            state.user = None;
            state.profile = None;
        }
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        if let Some(handle) = self.backend.handle() {
            if let Err(error) = handle.auth.sign_out().await {
                tracing::warn!(%error, "Remote sign-out failed; local state already cleared");
            }
        }
    }

    /// Update the current user's profile
    ///
    /// Requires a live session; local profile state is replaced only on
    /// confirmed success.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> bool {
        if self.state.lock().await.user.is_none() {
            return false;
        }
        match self.profiles.upsert(patch).await {
            Some(profile) => {
                self.state.lock().await.profile = Some(profile);
                true
            }
            None => false,
        }
    }

    // ---- Derived, read-only views ----

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.lock().await.lifecycle
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.lock().await.user.is_some()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.lock().await.user.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.lock().await.profile.clone()
    }

    /// Display name: nickname, else username, else the email local part,
    /// else a fixed placeholder
    pub async fn display_name(&self) -> String {
        let state = self.state.lock().await;
        if let Some(profile) = &state.profile {
            if let Some(nickname) = non_empty(profile.nickname.as_deref()) {
                return nickname.to_string();
            }
            if let Some(username) = non_empty(profile.username.as_deref()) {
                return username.to_string();
            }
        }
        if let Some(local) = state
            .user
            .as_ref()
            .and_then(User::email_local_part)
            .filter(|local| !local.is_empty())
        {
            return local.to_string();
        }
        DEFAULT_DISPLAY_NAME.to_string()
    }

    /// Avatar URL: the profile's stored URL, else a deterministic
    /// generated placeholder keyed by the user id
    pub async fn avatar_url(&self) -> String {
        let state = self.state.lock().await;
        if let Some(url) = state
            .profile
            .as_ref()
            .and_then(|profile| non_empty(profile.avatar_url.as_deref()))
        {
            return url.to_string();
        }
        let seed = state
            .user
            .as_ref()
            .map(|user| user.id.as_str())
            .unwrap_or("default");
        format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed)
    }

    #[cfg(test)]
    pub(crate) async fn set_state_for_tests(&self, user: Option<User>, profile: Option<Profile>) {
        let mut state = self.state.lock().await;
        state.user = user;
        state.profile = profile;
        state.lifecycle = Lifecycle::Ready;
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
