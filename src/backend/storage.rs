//! Object storage client
//!
//! Handles upload, delete, and public URL derivation for stored objects.
//! Objects are served from the backend's public object path.

use async_trait::async_trait;
use url::Url;

use super::auth::SessionStore;
use super::rest::extract_error_message;
use super::StorageApi;
use crate::error::{AppError, Result};

/// Live object storage client
pub struct RemoteStorage {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    session: SessionStore,
}

impl RemoteStorage {
    pub fn new(http: reqwest::Client, base: Url, anon_key: String, session: SessionStore) -> Self {
        Self {
            http,
            base,
            anon_key,
            session,
        }
    }

    /// Bearer token: the live session token when present, the anon key
    /// otherwise (storage policies key off the authenticated principal)
    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) if !session.is_expired() => session.access_token.clone(),
            _ => self.anon_key.clone(),
        }
    }

    /// Object URL under `/storage/v1/object/`, with each key segment
    /// percent-encoded
    fn object_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let encoded_key = encode_key(key);
        self.base
            .join(&format!("storage/v1/object/{}/{}", bucket, encoded_key))
            .map_err(|e| AppError::Storage(format!("Invalid object path: {}", e)))
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl StorageApi for RemoteStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let url = self.object_url(bucket, key)?;

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
            .header("content-type", content_type)
            .header("cache-control", "3600")
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(extract_error_message(&body, status)));
        }

        tracing::debug!(bucket, key, "Object uploaded");
        Ok(key.to_string())
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<()> {
        let url = self.object_url(bucket, key)?;

        let response = self
            .http
            .delete(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(extract_error_message(&body, status)));
        }

        tracing::debug!(bucket, key, "Object deleted");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}storage/v1/object/public/{}/{}",
            self.base,
            bucket,
            encode_key(key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_segments_are_encoded_individually() {
        assert_eq!(encode_key("user-1/169.jpg"), "user-1/169.jpg");
        assert_eq!(encode_key("user 1/pic 2.png"), "user%201/pic%202.png");
    }

    #[test]
    fn test_public_url_shape() {
        let storage = RemoteStorage::new(
            reqwest::Client::new(),
            Url::parse("https://example.supabase.co/").unwrap(),
            "anon".to_string(),
            SessionStore::default(),
        );
        assert_eq!(
            storage.public_url("avatars", "u1/1.jpg"),
            "https://example.supabase.co/storage/v1/object/public/avatars/u1/1.jpg"
        );
    }
}
