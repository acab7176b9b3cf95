//! Persisted session cache
//!
//! Stores the auth session as a JSON file so a restarted process (or the
//! theme's validity hook) can check signed-in state without a network
//! round trip. Every validity query checks the explicit expiry timestamp;
//! expired entries are deleted eagerly.

use std::path::PathBuf;

use crate::data::Session;

/// File-backed session cache
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Persist a session
    pub fn store(&self, session: &Session) {
        let payload = match serde_json::to_vec(session) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "Failed to serialize session for caching");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                tracing::warn!(%error, "Failed to create session cache directory");
                return;
            }
        }
        if let Err(error) = std::fs::write(&self.path, payload) {
            tracing::warn!(%error, path = %self.path.display(), "Failed to persist session");
        }
    }

    /// Load the cached session, deleting it if expired or unreadable
    pub fn load(&self) -> Option<Session> {
        let raw = std::fs::read(&self.path).ok()?;
        let session: Session = match serde_json::from_slice(&raw) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(%error, "Corrupt session cache; discarding");
                self.clear();
                return None;
            }
        };
        if session.is_expired() {
            tracing::debug!("Cached session expired; discarding");
            self.clear();
            return None;
        }
        Some(session)
    }

    /// Whether a live (non-expired) session is cached
    pub fn is_valid(&self) -> bool {
        self.load().is_some()
    }

    /// Remove the cached session
    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "Failed to clear session cache");
            }
        }
    }
}
