//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

/// Backend-as-a-service connection configuration
///
/// Both fields are required for a live backend. When either is missing,
/// `Backend::from_config` returns the disabled handle and every dependent
/// operation degrades to empty/neutral results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    /// Backend endpoint URL (e.g., "https://xyzcompany.supabase.co")
    pub url: Option<String>,
    /// Public (anon) API key
    pub anon_key: Option<String>,
}

impl BackendConfig {
    /// Read endpoint and key from `TEEKDOCS_BACKEND_URL` /
    /// `TEEKDOCS_BACKEND_ANON_KEY`, the same injection point a bundler
    /// would use.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("TEEKDOCS_BACKEND_URL").ok(),
            anon_key: std::env::var("TEEKDOCS_BACKEND_ANON_KEY").ok(),
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket name for avatar images (default: "avatars")
    #[serde(default = "default_avatar_bucket")]
    pub avatar_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            avatar_bucket: default_avatar_bucket(),
        }
    }
}

fn default_avatar_bucket() -> String {
    "avatars".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Path for the persisted session cache file
    ///
    /// If unset, no session is persisted across processes.
    pub session_cache_path: Option<PathBuf>,
    /// Static fallback users for degraded mode (backend unreachable)
    #[serde(default)]
    pub fallback_users: Vec<FallbackUser>,
}

/// A static fallback credential triple
///
/// Explicitly a degraded-mode path, not the primary auth mechanism.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FallbackUser {
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Site metadata used as local defaults for remote-configured values
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site name shown when the remote config has no `site_name` entry
    #[serde(default = "default_site_name")]
    pub default_name: String,
    /// Enable the theme's private-content feature
    #[serde(default)]
    pub private_enabled: bool,
    /// Require login for the whole site (implies private content)
    #[serde(default)]
    pub site_login: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_name: default_site_name(),
            private_enabled: false,
            site_login: false,
        }
    }
}

fn default_site_name() -> String {
    "Teekdocs".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (TEEKDOCS_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("storage.avatar_bucket", "avatars")?
            .set_default("site.default_name", "Teekdocs")?
            .set_default("site.private_enabled", false)?
            .set_default("site.site_login", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (TEEKDOCS_*)
            .add_source(
                Environment::with_prefix("TEEKDOCS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if let Some(url) = &self.backend.url {
            url::Url::parse(url).map_err(|e| {
                crate::error::AppError::Config(format!("backend.url is not a valid URL: {}", e))
            })?;
        }
        if self.backend.url.is_some() != self.backend.anon_key.is_some() {
            tracing::warn!(
                "Backend configuration is incomplete (url and anon_key must both be set); \
                 running with the backend disabled"
            );
        }
        if self.storage.avatar_bucket.is_empty() {
            return Err(crate::error::AppError::Config(
                "storage.avatar_bucket must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_backend_config_is_not_an_error() {
        let cfg = AppConfig {
            backend: BackendConfig {
                url: Some("https://example.supabase.co".to_string()),
                anon_key: None,
            },
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            site: SiteConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_backend_url_is_rejected() {
        let cfg = AppConfig {
            backend: BackendConfig {
                url: Some("not a url".to_string()),
                anon_key: Some("key".to_string()),
            },
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            site: SiteConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(cfg.validate().is_err());
    }
}
