//! Site configuration gateway
//!
//! Generic key-value store for site-wide settings (site name, social
//! links, footer text) kept in the `site_config` table. Writes are
//! authorized by the remote store; reads fall back to local defaults.

use std::collections::HashMap;

use serde_json::Value;

use crate::backend::{Backend, Query};

/// Site configuration gateway
#[derive(Clone)]
pub struct SiteConfigStore {
    backend: Backend,
    /// Local default for the site name when the remote entry is missing
    default_name: String,
}

impl SiteConfigStore {
    pub fn new(backend: Backend, default_name: String) -> Self {
        Self {
            backend,
            default_name,
        }
    }

    /// Fetch one configuration value by key
    pub async fn get(&self, key: &str) -> Option<Value> {
        let handle = self.backend.handle()?;
        let query = Query::new().select("value").eq("key", key).limit(1);
        match handle.rest.select("site_config", query).await {
            Ok(rows) => rows
                .into_iter()
                .next()
                .and_then(|mut row| row.get_mut("value").map(Value::take))
                .filter(|value| !value.is_null()),
            Err(error) => {
                tracing::error!(%error, key, "Failed to fetch config entry");
                None
            }
        }
    }

    /// Fetch all configuration entries as a key-value map
    pub async fn all(&self) -> HashMap<String, Value> {
        let Some(handle) = self.backend.handle() else {
            return HashMap::new();
        };
        match handle.rest.select("site_config", Query::new().select("*")).await {
            Ok(rows) => {
                let mut configs = HashMap::new();
                for mut row in rows {
                    let Some(key) = row.get("key").and_then(Value::as_str).map(str::to_string)
                    else {
                        continue;
                    };
                    let value = row.get_mut("value").map(Value::take).unwrap_or(Value::Null);
                    configs.insert(key, value);
                }
                configs
            }
            Err(error) => {
                tracing::error!(%error, "Failed to fetch config entries");
                HashMap::new()
            }
        }
    }

    /// Update one configuration value
    ///
    /// Authorization is the remote store's concern (admin-only policy);
    /// this layer only reports success or failure.
    pub async fn set(&self, key: &str, value: Value) -> bool {
        let Some(handle) = self.backend.handle() else {
            return false;
        };
        let result = handle
            .rest
            .update(
                "site_config",
                Query::new().eq("key", key),
                serde_json::json!({ "value": value }),
            )
            .await;
        match result {
            Ok(_) => true,
            Err(error) => {
                tracing::error!(%error, key, "Failed to update config entry");
                false
            }
        }
    }

    /// Site name, with the configured local default as fallback
    pub async fn site_name(&self) -> String {
        self.get("site_name")
            .await
            .and_then(|value| {
                value
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.default_name.clone())
    }

    /// Social links map (platform → URL)
    pub async fn social_links(&self) -> HashMap<String, String> {
        self.get("social_links")
            .await
            .map(string_map)
            .unwrap_or_default()
    }

    /// Footer info map (field → text)
    pub async fn footer_info(&self) -> HashMap<String, String> {
        self.get("footer_info")
            .await
            .map(string_map)
            .unwrap_or_default()
    }
}

fn string_map(value: Value) -> HashMap<String, String> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(text) => Some((key, text)),
                _ => None,
            })
            .collect(),
        _ => HashMap::new(),
    }
}
