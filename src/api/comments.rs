//! Comments gateway
//!
//! Listing is a two-phase fetch: top-level comments first, then each
//! comment's direct replies in a separate query. N top-level comments
//! cost 1 + N round trips; replies of replies are never fetched.

use serde_json::Value;

use crate::auth::messages;
use crate::backend::{Backend, Query};
use crate::data::{Comment, CommentDraft};
use crate::error::{AppError, Result};

const AUTHOR_EMBED: &str = "*, author:profiles(*)";

/// Comments resource gateway
#[derive(Clone)]
pub struct Comments {
    backend: Backend,
}

impl Comments {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Visible comments for a post
    ///
    /// Top-level comments (no parent, not hidden) newest first, each
    /// carrying its visible direct replies oldest first. Returns an empty
    /// list on any failure after logging it.
    pub async fn list_for_post(&self, post_id: &str) -> Vec<Comment> {
        let Some(handle) = self.backend.handle() else {
            return Vec::new();
        };

        let top_query = Query::new()
            .select(AUTHOR_EMBED)
            .eq("post_id", post_id)
            .eq("is_hidden", "false")
            .is_null("parent_id")
            .order("created_at", false);

        let rows = match handle.rest.select("comments", top_query).await {
            Ok(rows) => rows,
            Err(error) => {
                tracing::error!(%error, post_id, "Failed to fetch comments");
                return Vec::new();
            }
        };

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(mut comment) = parse_row(row) else {
                continue;
            };

            let reply_query = Query::new()
                .select(AUTHOR_EMBED)
                .eq("parent_id", comment.id.clone())
                .eq("is_hidden", "false")
                .order("created_at", true);
            comment.replies = match handle.rest.select("comments", reply_query).await {
                Ok(reply_rows) => reply_rows.into_iter().filter_map(parse_row).collect(),
                Err(error) => {
                    tracing::error!(%error, comment_id = %comment.id, "Failed to fetch replies");
                    Vec::new()
                }
            };

            comments.push(comment);
        }

        tracing::debug!(post_id, count = comments.len(), "Comments loaded");
        comments
    }

    /// Create a comment as the current user
    ///
    /// The one CRUD path that raises instead of returning a neutral
    /// value: the calling UI uses the failure for flow control. The error
    /// message is already translated.
    ///
    /// # Errors
    /// `AppError::Unauthorized` without a session (no remote write is
    /// issued); `AppError::Auth` with a user-facing message when the
    /// backend rejects the write.
    pub async fn create(&self, draft: &CommentDraft) -> Result<Comment> {
        let Some(handle) = self.backend.handle() else {
            return Err(AppError::BackendDisabled);
        };
        let user = match handle.auth.current_user().await {
            Ok(Some(user)) => user,
            _ => {
                tracing::warn!("Comment creation attempted without a session");
                return Err(AppError::Unauthorized);
            }
        };

        let mut body = match serde_json::to_value(draft)? {
            Value::Object(map) => map,
            _ => return Err(AppError::Validation("Malformed comment draft".to_string())),
        };
        body.insert("user_id".to_string(), Value::String(user.id));

        match handle.rest.insert("comments", Value::Object(body)).await {
            Ok(row) => parse_row(row).ok_or_else(|| {
                AppError::Backend("Malformed comment row from backend".to_string())
            }),
            Err(AppError::Backend(message)) => {
                tracing::error!(message, "Failed to create comment");
                Err(AppError::Auth(messages::translate(&message)))
            }
            Err(error) => {
                tracing::error!(%error, "Failed to create comment");
                Err(error)
            }
        }
    }

    /// Delete the current user's comment
    ///
    /// The delete request is scoped to the acting user's id, so deleting
    /// someone else's comment is rejected by the remote store's own
    /// authorization.
    pub async fn delete(&self, id: &str) -> bool {
        let Some(handle) = self.backend.handle() else {
            return false;
        };
        let user = match handle.auth.current_user().await {
            Ok(Some(user)) => user,
            _ => return false,
        };

        let query = Query::new().eq("id", id).eq("user_id", user.id);
        match handle.rest.delete("comments", query).await {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(%error, id, "Failed to delete comment");
                false
            }
        }
    }

    /// Like a comment (best effort)
    ///
    /// Tries the atomic `like_comment` procedure, then the racy
    /// read-then-write fallback. Always reports success: a lost like is
    /// not worth surfacing to the reader.
    pub async fn like(&self, id: &str) -> bool {
        let Some(handle) = self.backend.handle() else {
            return true;
        };

        if handle
            .rest
            .rpc("like_comment", serde_json::json!({ "comment_id": id }))
            .await
            .is_ok()
        {
            return true;
        }

        tracing::debug!(id, "like_comment RPC missing; using fallback");
        let query = Query::new().select("like_count").eq("id", id).limit(1);
        let current = match handle.rest.select("comments", query).await {
            Ok(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| row.get("like_count").and_then(Value::as_i64)),
            Err(error) => {
                tracing::error!(%error, id, "Like count read failed");
                return true;
            }
        };

        if let Some(count) = current {
            let result = handle
                .rest
                .update(
                    "comments",
                    Query::new().eq("id", id),
                    serde_json::json!({ "like_count": count + 1 }),
                )
                .await;
            if let Err(error) = result {
                tracing::error!(%error, id, "Like count write failed");
            }
        }
        true
    }
}

fn parse_row(row: Value) -> Option<Comment> {
    match serde_json::from_value(row) {
        Ok(comment) => Some(comment),
        Err(error) => {
            tracing::error!(%error, "Malformed comment row from backend");
            None
        }
    }
}
