//! Teekdocs — backend client layer for a docs/blog site
//!
//! A headless client SDK for a statically generated documentation site
//! with dynamic features (posts, comments, profiles, private content)
//! served by a backend-as-a-service endpoint. The site keeps working
//! when that endpoint is not configured or unreachable: the backend
//! handle degrades to a disabled state and every read surface returns
//! empty or neutral results instead of failing.
//!
//! # Architecture
//!
//! - [`backend`] — the lazily-constructed remote gateway client:
//!   database API, auth, and object storage facades behind trait seams
//! - [`auth`] — error message translation and the session controller
//!   (lifecycle, login/logout/registration, derived display values)
//! - [`api`] — resource gateways: posts, comments, profiles, remote
//!   site configuration, and avatar uploads
//! - [`site`] — the static-site-generator boundary: theme
//!   configuration, the persisted session cache, fallback credentials,
//!   and the private-content hooks
//! - [`data`] — wire models shared by all of the above
//!
//! # Example
//!
//! ```no_run
//! use teekdocs::{AppConfig, SiteClient};
//!
//! # async fn run() -> teekdocs::Result<()> {
//! let config = AppConfig::load()?;
//! let client = SiteClient::new(config);
//! client.session().initialize().await;
//!
//! let posts = client.posts().list(&Default::default()).await;
//! println!("{} posts", posts.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod site;

use std::sync::Arc;

use api::{Avatars, Comments, Posts, Profiles, SiteConfigStore};
use auth::SessionController;
use backend::Backend;
use site::{SessionGate, ThemeConfig};

pub use config::AppConfig;
pub use error::{AppError, Result};

/// Aggregate client: one backend handle, all gateways, one session
///
/// Cheap to clone; clones share the backend handle and session state.
#[derive(Clone)]
pub struct SiteClient {
    config: Arc<AppConfig>,
    backend: Backend,
    session: SessionController,
    posts: Posts,
    comments: Comments,
    profiles: Profiles,
    site_config: SiteConfigStore,
    avatars: Avatars,
}

impl SiteClient {
    /// Build a client from configuration
    ///
    /// Never fails: incomplete backend configuration yields a client
    /// whose gateways all degrade gracefully.
    pub fn new(config: AppConfig) -> Self {
        let backend = Backend::from_config(&config.backend);
        Self::with_backend(config, backend)
    }

    fn with_backend(config: AppConfig, backend: Backend) -> Self {
        let session = SessionController::new(backend.clone(), &config.auth);
        let posts = Posts::new(backend.clone());
        let comments = Comments::new(backend.clone());
        let profiles = Profiles::new(backend.clone());
        let site_config =
            SiteConfigStore::new(backend.clone(), config.site.default_name.clone());
        let avatars = Avatars::new(backend.clone(), config.storage.avatar_bucket.clone());
        Self {
            config: Arc::new(config),
            backend,
            session,
            posts,
            comments,
            profiles,
            site_config,
            avatars,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn posts(&self) -> &Posts {
        &self.posts
    }

    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    pub fn site_config(&self) -> &SiteConfigStore {
        &self.site_config
    }

    pub fn avatars(&self) -> &Avatars {
        &self.avatars
    }

    /// Theme configuration for the external site generator
    pub fn theme_config(&self) -> ThemeConfig {
        ThemeConfig::from_site(&self.config.site)
    }

    /// Private-content hooks bound to this client's session
    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.session.clone())
    }
}
