//! Profiles gateway
//!
//! One profile per auth principal, keyed by the auth user id. Mutations
//! are session-gated locally; reads degrade to `None`.

use serde_json::Value;

use crate::backend::{Backend, Query};
use crate::data::{Profile, ProfilePatch};

/// Profiles resource gateway
#[derive(Clone)]
pub struct Profiles {
    backend: Backend,
}

impl Profiles {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Profile of the current user, if signed in
    pub async fn current(&self) -> Option<Profile> {
        let handle = self.backend.handle()?;
        let user = handle.auth.current_user().await.ok().flatten()?;
        self.get_one(Query::new().select("*").eq("id", user.id).limit(1))
            .await
    }

    /// Look up a profile by username
    pub async fn by_username(&self, username: &str) -> Option<Profile> {
        self.get_one(
            Query::new()
                .select("*")
                .eq("username", username)
                .limit(1),
        )
        .await
    }

    async fn get_one(&self, query: Query) -> Option<Profile> {
        let handle = self.backend.handle()?;
        match handle.rest.select("profiles", query).await {
            Ok(rows) => rows.into_iter().next().and_then(parse_row),
            Err(error) => {
                tracing::error!(%error, "Failed to fetch profile");
                None
            }
        }
    }

    /// Create or update the current user's profile
    ///
    /// Requires an authenticated session; without one this returns `None`
    /// without contacting the remote store.
    pub async fn upsert(&self, patch: &ProfilePatch) -> Option<Profile> {
        let handle = self.backend.handle()?;
        let user = match handle.auth.current_user().await {
            Ok(Some(user)) => user,
            _ => {
                tracing::warn!("Profile upsert attempted without a session");
                return None;
            }
        };

        let mut body = match serde_json::to_value(patch) {
            Ok(Value::Object(map)) => map,
            _ => return None,
        };
        body.insert("id".to_string(), Value::String(user.id));

        match handle
            .rest
            .upsert("profiles", Value::Object(body), "id")
            .await
        {
            Ok(row) => parse_row(row),
            Err(error) => {
                tracing::error!(%error, "Failed to upsert profile");
                None
            }
        }
    }

    /// Update fields of the current user's profile
    pub async fn update(&self, patch: &ProfilePatch) -> Option<Profile> {
        let handle = self.backend.handle()?;
        let user = match handle.auth.current_user().await {
            Ok(Some(user)) => user,
            _ => {
                tracing::warn!("Profile update attempted without a session");
                return None;
            }
        };

        let body = serde_json::to_value(patch).ok()?;
        match handle
            .rest
            .update("profiles", Query::new().eq("id", user.id), body)
            .await
        {
            Ok(row) => parse_row(row),
            Err(error) => {
                tracing::error!(%error, "Failed to update profile");
                None
            }
        }
    }
}

fn parse_row(row: Value) -> Option<Profile> {
    match serde_json::from_value(row) {
        Ok(profile) => Some(profile),
        Err(error) => {
            tracing::error!(%error, "Malformed profile row from backend");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockAuthApi, MockRestApi, MockStorageApi};
    use crate::data::User;
    use std::sync::Arc;

    fn backend(rest: MockRestApi, auth: MockAuthApi) -> Backend {
        Backend::from_parts(Arc::new(rest), Arc::new(auth), Arc::new(MockStorageApi::new()))
    }

    fn user() -> User {
        User {
            id: "user-1".to_string(),
            email: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_current_returns_none_when_signed_out() {
        let mut auth = MockAuthApi::new();
        auth.expect_current_user().returning(|| Ok(None));
        let mut rest = MockRestApi::new();
        rest.expect_select().times(0);

        let profiles = Profiles::new(backend(rest, auth));
        assert!(profiles.current().await.is_none());
    }

    #[tokio::test]
    async fn test_upsert_without_session_issues_no_remote_write() {
        let mut auth = MockAuthApi::new();
        auth.expect_current_user().returning(|| Ok(None));
        let mut rest = MockRestApi::new();
        rest.expect_upsert().times(0);

        let profiles = Profiles::new(backend(rest, auth));
        assert!(profiles.upsert(&ProfilePatch::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_keyed_on_the_user_id() {
        let mut auth = MockAuthApi::new();
        auth.expect_current_user().returning(|| Ok(Some(user())));
        let mut rest = MockRestApi::new();
        rest.expect_upsert()
            .withf(|table, body, on_conflict| {
                table == "profiles" && body["id"] == "user-1" && on_conflict == "id"
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(serde_json::json!({
                    "id": "user-1",
                    "username": "alice",
                    "nickname": "Alice",
                    "avatar_url": null,
                    "bio": null,
                    "website": null,
                }))
            });

        let profiles = Profiles::new(backend(rest, auth));
        let patch = ProfilePatch {
            nickname: Some("Alice".to_string()),
            ..Default::default()
        };
        let profile = profiles.upsert(&patch).await.unwrap();
        assert_eq!(profile.nickname.as_deref(), Some("Alice"));
    }
}
