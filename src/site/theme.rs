//! Site-generation framework boundary
//!
//! Configuration objects consumed by the external static-site
//! generator/theme, plus the pluggable hooks its private-content feature
//! invokes. Page rendering, navigation generation, and markdown
//! processing all live on the other side of this boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;

/// Author block shown in the theme footer/byline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// One navigation entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavItem {
    pub text: String,
    pub link: String,
}

/// Footer copyright block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Copyright {
    pub create_year: i32,
    pub suffix: String,
}

/// Footer information block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FooterInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<Copyright>,
}

/// Private-content feature toggles
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateConfig {
    /// Enable private-content protection
    pub enabled: bool,
    /// Require login for the whole site
    pub site_login: bool,
}

/// Theme configuration handed to the external site generator
///
/// Serialized wholesale; the generator treats it as opaque settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Show the theme's blog-style home page
    pub teek_home: bool,
    /// Keep the generator's native home page
    pub vp_home: bool,
    /// Sidebar collapse trigger
    pub sidebar_trigger: bool,
    /// Article share button
    pub article_share: bool,
    pub author: Author,
    #[serde(default)]
    pub nav: Vec<NavItem>,
    pub footer_info: FooterInfo,
    /// Localized UI strings keyed by message id
    #[serde(default)]
    pub ui_strings: HashMap<String, String>,
    pub private: PrivateConfig,
}

impl ThemeConfig {
    /// Build the theme configuration from local site settings
    pub fn from_site(site: &SiteConfig) -> Self {
        Self {
            teek_home: false,
            vp_home: true,
            sidebar_trigger: true,
            article_share: true,
            author: Author {
                name: site.default_name.clone(),
                link: None,
            },
            nav: Vec::new(),
            footer_info: FooterInfo {
                theme_name: None,
                copyright: None,
            },
            ui_strings: HashMap::new(),
            private: PrivateConfig {
                enabled: site.private_enabled,
                site_login: site.site_login,
            },
        }
    }
}

/// Result of the pluggable login callback
///
/// `Handled` means the callback performed the post-login navigation
/// itself and the framework should do nothing further; `Success` and
/// `Failure` hand the outcome back for the framework to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Handled,
    Success,
    Failure(String),
}

/// Hooks the theme's private-content feature invokes
#[async_trait]
pub trait PrivateAccess: Send + Sync {
    /// Attempt a login with the form's credentials
    async fn login(&self, username: &str, password: &str) -> LoginOutcome;

    /// Whether the current visitor holds a valid session
    async fn validate(&self) -> bool;
}
