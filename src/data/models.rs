//! Data models
//!
//! Rust structs mirroring the remote schema. The backend mints all ids and
//! timestamps; this layer never generates identifiers locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Auth types
// =============================================================================

/// An authenticated principal as returned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Local part of the email address, if any
    pub fn email_local_part(&self) -> Option<&str> {
        self.email.as_deref().and_then(|e| e.split('@').next())
    }
}

/// A live session minted by the auth service
///
/// Created on successful login or session restoration; destroyed on logout
/// or expiry. Owned exclusively by the auth subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) at which the access token expires
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    /// Check if the session is expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() > expires_at,
            None => false,
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

/// User-editable metadata, one-to-one with an auth principal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Equals the auth user id
    pub id: String,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub social_links: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial profile update
///
/// Only set fields are serialized, so an upsert body carries exactly the
/// caller's changes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<HashMap<String, String>>,
}

// =============================================================================
// Post
// =============================================================================

/// Post lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    /// Wire representation, as used in query filters
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

/// A blog post
///
/// The slug is the external-facing stable identifier; slug uniqueness is
/// enforced by the remote store, not by this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PostStatus,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Denormalized author profile, attached by the posts gateway queries
    #[serde(default)]
    pub author: Option<Profile>,
}

/// Insert/update shape for posts
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post
///
/// `parent_id == None` means top-level. Replies are loaded one level deep;
/// replies of replies are not recursively fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    /// None for anonymous comments
    pub user_id: Option<String>,
    pub parent_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_hidden: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Denormalized author profile
    #[serde(default)]
    pub author: Option<Profile>,
    /// Direct (visible) replies, oldest first
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Insert shape for comments
#[derive(Debug, Clone, Serialize)]
pub struct CommentDraft {
    pub post_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

// =============================================================================
// Site configuration
// =============================================================================

/// A site-wide key-value configuration entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfigEntry {
    pub id: String,
    /// Unique key (e.g., "site_name", "social_links", "footer_info")
    pub key: String,
    /// Opaque structured value
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expiry() {
        let user = User {
            id: "u1".to_string(),
            email: Some("alice@example.com".to_string()),
            created_at: None,
        };
        let live = Session {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now().timestamp() + 3600),
            user: user.clone(),
        };
        assert!(!live.is_expired());

        let stale = Session {
            expires_at: Some(Utc::now().timestamp() - 1),
            ..live.clone()
        };
        assert!(stale.is_expired());

        // No expiry recorded means the session is taken at face value
        let open_ended = Session {
            expires_at: None,
            ..live
        };
        assert!(!open_ended.is_expired());
    }

    #[test]
    fn test_email_local_part() {
        let user = User {
            id: "u1".to_string(),
            email: Some("alice@example.com".to_string()),
            created_at: None,
        };
        assert_eq!(user.email_local_part(), Some("alice"));

        let no_email = User {
            id: "u2".to_string(),
            email: None,
            created_at: None,
        };
        assert_eq!(no_email.email_local_part(), None);
    }

    #[test]
    fn test_post_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PostStatus::Published).unwrap(),
            "\"published\""
        );
        let status: PostStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, PostStatus::Archived);
    }

    #[test]
    fn test_post_draft_serializes_only_set_fields() {
        let draft = PostDraft {
            title: Some("Hello".to_string()),
            slug: Some("hello".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["title"], "Hello");
    }

    #[test]
    fn test_comment_deserializes_without_optional_fields() {
        let raw = serde_json::json!({
            "id": "c1",
            "post_id": "p1",
            "user_id": null,
            "parent_id": null,
            "content": "hi",
        });
        let comment: Comment = serde_json::from_value(raw).unwrap();
        assert!(comment.is_top_level());
        assert!(comment.replies.is_empty());
        assert!(!comment.is_hidden);
    }
}
