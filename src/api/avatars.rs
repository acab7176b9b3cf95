//! Avatar upload gateway
//!
//! Validates and uploads avatar images to the avatars bucket, derives
//! their public URL, and cleans up superseded objects. Validation happens
//! before any network call.

use chrono::Utc;

use crate::backend::Backend;
use crate::error::{AppError, Result};

/// Maximum accepted avatar size (5 MiB)
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Avatar storage gateway
#[derive(Clone)]
pub struct Avatars {
    backend: Backend,
    bucket: String,
}

impl Avatars {
    pub fn new(backend: Backend, bucket: String) -> Self {
        Self { backend, bucket }
    }

    /// Upload an avatar image for a user
    ///
    /// # Arguments
    /// * `data` - Image bytes
    /// * `file_name` - Original file name (extension source)
    /// * `content_type` - MIME type; must indicate an image
    /// * `owner_id` - Owning user's id
    ///
    /// # Returns
    /// Public URL of the stored object. The object key is
    /// `{owner_id}/{timestamp}.{ext}` with overwrite-on-conflict, so
    /// repeated uploads never collide with each other.
    ///
    /// # Errors
    /// `AppError::Validation` for a non-image MIME type or an oversized
    /// file (no network call is made); `AppError::Storage` with a
    /// user-facing message for remote failures.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
        owner_id: &str,
    ) -> Result<String> {
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(
                "Please select an image file".to_string(),
            ));
        }
        if data.len() > MAX_AVATAR_BYTES {
            return Err(AppError::Validation(
                "Image must not exceed 5 MB".to_string(),
            ));
        }

        let Some(handle) = self.backend.handle() else {
            return Err(AppError::Storage(
                "Storage is not configured".to_string(),
            ));
        };

        let key = format!(
            "{}/{}.{}",
            owner_id,
            Utc::now().timestamp_millis(),
            extension(file_name)
        );
        tracing::info!(key, size = data.len(), "Uploading avatar");

        match handle
            .storage
            .upload(&self.bucket, &key, data, content_type, true)
            .await
        {
            Ok(stored_key) => Ok(handle.storage.public_url(&self.bucket, &stored_key)),
            Err(error) => {
                tracing::error!(%error, key, "Avatar upload failed");
                Err(AppError::Storage(classify_storage_error(
                    &error.to_string(),
                    &self.bucket,
                )))
            }
        }
    }

    /// Delete a superseded avatar object (best effort)
    ///
    /// A no-op unless the URL matches this system's own public storage
    /// shape; external avatar URLs are left alone. Failures are swallowed:
    /// old-avatar cleanup is not safety-critical.
    pub async fn delete_superseded(&self, avatar_url: &str) {
        let Some(handle) = self.backend.handle() else {
            return;
        };
        let Some(key) = self.extract_key(avatar_url) else {
            tracing::debug!(avatar_url, "Not a managed avatar URL; skipping delete");
            return;
        };

        tracing::info!(key, "Deleting superseded avatar");
        if let Err(error) = handle.storage.remove(&self.bucket, &key).await {
            tracing::warn!(%error, key, "Superseded avatar delete failed");
        }
    }

    /// Object key embedded in one of our own public URLs, if any
    fn extract_key(&self, url: &str) -> Option<String> {
        let shape = format!("/storage/v1/object/public/{}/", self.bucket);
        if !url.contains(&shape) {
            return None;
        }
        let marker = format!("/{}/", self.bucket);
        let (_, key) = url.rsplit_once(&marker)?;
        if key.is_empty() {
            return None;
        }
        Some(key.to_string())
    }
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "jpg".to_string())
}

/// Map a raw storage error onto a user-facing message
fn classify_storage_error(raw: &str, bucket: &str) -> String {
    let lowered = raw.to_lowercase();
    if lowered.contains("bucket not found") {
        return format!(
            "Storage bucket missing; ask an administrator to create the {} bucket",
            bucket
        );
    }
    if lowered.contains("not allowed") || lowered.contains("permission") {
        return "No upload permission; ask an administrator to adjust the storage policy"
            .to_string();
    }
    if lowered.contains("quota") {
        return "Storage quota exceeded".to_string();
    }
    format!("Upload failed: {}", raw)
}
