//! Auth service client
//!
//! Speaks a GoTrue-style interface. The live session is held here (shared
//! with the REST client for bearer tokens) and every sign-in/sign-out
//! transition is published as an [`AuthEvent`]; the session controller's
//! state is updated from that event stream, never from a call's return
//! path.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use url::Url;

use super::rest::extract_error_message;
use super::{AuthApi, AuthEvent};
use crate::data::{Session, User};
use crate::error::{AppError, Result};

/// Shared slot for the live session
///
/// One writer (this client), many readers (the REST client's bearer
/// selection). The lock is required on a multi-threaded runtime.
pub type SessionStore = Arc<RwLock<Option<Session>>>;

/// Live auth service client
pub struct RemoteAuth {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    session: SessionStore,
    events: broadcast::Sender<AuthEvent>,
}

impl RemoteAuth {
    pub fn new(
        http: reqwest::Client,
        base: Url,
        anon_key: String,
        session: SessionStore,
        events: broadcast::Sender<AuthEvent>,
    ) -> Self {
        Self {
            http,
            base,
            anon_key,
            session,
            events,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(&format!("auth/v1/{}", path))
            .map_err(|e| AppError::Backend(format!("Invalid auth path: {}", e)))
    }

    fn publish(&self, event: AuthEvent) {
        // No subscriber yet is fine: events before initialization carry
        // nothing the initial fetch will not observe anyway.
        let _ = self.events.send(event);
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Backend(extract_error_message(&body, status)))
    }
}

#[async_trait]
impl AuthApi for RemoteAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Session = Self::check(response).await?.json().await?;

        *self.session.write().await = Some(session.clone());
        self.publish(AuthEvent::SignedIn(session.clone()));

        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        let url = self.endpoint("signup")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::check(response).await?;

        tracing::info!(email, "Sign-up accepted");
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        // Client-authoritative: drop the session before telling the
        // backend, so a failed remote call cannot repopulate state.
        let token = self.session.write().await.take().map(|s| s.access_token);
        self.publish(AuthEvent::SignedOut);

        if let Some(token) = token {
            let url = self.endpoint("logout")?;
            let response = self
                .http
                .post(url)
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await?;
            Self::check(response).await?;
        }

        tracing::info!("Signed out");
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>> {
        let mut guard = self.session.write().await;
        match guard.as_ref() {
            Some(session) if session.is_expired() => {
                // Expired entries are dropped eagerly
                *guard = None;
                Ok(None)
            }
            Some(session) => Ok(Some(session.user.clone())),
            None => Ok(None),
        }
    }

    async fn restore(&self, session: Session) -> Result<Option<User>> {
        if session.is_expired() {
            return Ok(None);
        }

        // Validate the token against the auth service before adopting it
        let url = self.endpoint("user")?;
        let response = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        let user: User = Self::check(response).await?.json().await?;

        let session = Session {
            user: user.clone(),
            ..session
        };
        *self.session.write().await = Some(session);

        tracing::info!(user_id = %user.id, "Session restored");
        Ok(Some(user))
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        let url = self.endpoint("recover")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::check(response).await?;

        tracing::info!(email, "Password recovery email requested");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
