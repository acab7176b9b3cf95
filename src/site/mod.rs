//! Site-side integration
//!
//! Everything that sits between the client SDK and the external
//! static-site generator: the theme configuration boundary, the
//! persisted session cache, the static fallback credentials, and the
//! [`SessionGate`] that wires the theme's private-content hooks to the
//! session controller.

pub mod fallback;
pub mod session_cache;
pub mod theme;

use async_trait::async_trait;

use crate::auth::SessionController;

pub use session_cache::SessionCache;
pub use theme::{
    Author, Copyright, FooterInfo, LoginOutcome, NavItem, PrivateAccess, PrivateConfig,
    ThemeConfig,
};

/// Bridges the theme's private-content hooks to the session controller
#[derive(Clone)]
pub struct SessionGate {
    session: SessionController,
}

impl SessionGate {
    pub fn new(session: SessionController) -> Self {
        Self { session }
    }
}

#[async_trait]
impl PrivateAccess for SessionGate {
    /// Login hook: outcome messages are already translated for display
    async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        match self.session.login(username, password).await {
            Ok(()) => LoginOutcome::Success,
            Err(error) => LoginOutcome::Failure(error.to_string()),
        }
    }

    /// Validity hook, called on every protected-page visit
    async fn validate(&self) -> bool {
        // Lazy: the first protected-page visit initializes the controller
        self.session.initialize().await;
        self.session.is_logged_in().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::{AuthConfig, FallbackUser};

    fn gate_with_fallback() -> SessionGate {
        let auth_config = AuthConfig {
            session_cache_path: None,
            fallback_users: vec![FallbackUser {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                role: "admin".to_string(),
            }],
        };
        SessionGate::new(SessionController::new(Backend::Disabled, &auth_config))
    }

    #[tokio::test]
    async fn test_gate_reports_login_outcome() {
        let gate = gate_with_fallback();
        assert!(!gate.validate().await);

        match gate.login("admin", "nope").await {
            LoginOutcome::Failure(message) => {
                assert_eq!(message, "Incorrect email or password");
            }
            other => panic!("expected failure, got {:?}", other),
        }

        assert_eq!(gate.login("admin", "admin123").await, LoginOutcome::Success);
        assert!(gate.validate().await);
    }
}
