//! E2E tests for degraded mode (no backend configured)
//!
//! The client must stay fully usable with an empty configuration: every
//! read surface returns empty or neutral results, writes fail with a
//! clear error, and the static fallback credentials still open the gate.

use teekdocs::api::PostFilter;
use teekdocs::config::{AppConfig, FallbackUser};
use teekdocs::data::CommentDraft;
use teekdocs::site::{LoginOutcome, PrivateAccess};
use teekdocs::{AppError, SiteClient};

fn client() -> SiteClient {
    SiteClient::new(AppConfig::default())
}

#[tokio::test]
async fn test_backend_is_disabled_with_empty_config() {
    assert!(!client().backend().is_enabled());
}

#[tokio::test]
async fn test_reads_return_empty_or_neutral_results() {
    let client = client();

    assert!(client.posts().list(&PostFilter::default()).await.is_empty());
    assert!(client.posts().get_by_slug("intro").await.is_none());
    assert!(client.posts().categories().await.is_empty());
    assert!(client.comments().list_for_post("post-1").await.is_empty());
    assert!(client.profiles().by_username("alice").await.is_none());
    assert!(client.site_config().get("site_name").await.is_none());
}

#[tokio::test]
async fn test_site_name_falls_back_to_the_local_default() {
    assert_eq!(client().site_config().site_name().await, "Teekdocs");
}

#[tokio::test]
async fn test_comment_creation_raises_rather_than_silently_dropping() {
    let draft = CommentDraft {
        post_id: "post-1".to_string(),
        content: "hello".to_string(),
        parent_id: None,
    };
    let result = client().comments().create(&draft).await;
    assert!(matches!(result, Err(AppError::BackendDisabled)));
}

#[tokio::test]
async fn test_avatar_upload_reports_unconfigured_storage() {
    let result = client()
        .avatars()
        .upload(vec![0; 16], "me.png", "image/png", "user-1")
        .await;
    match result {
        Err(AppError::Storage(message)) => {
            assert_eq!(message, "Storage is not configured");
        }
        other => panic!("expected storage error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_avatar_validation_still_applies() {
    // Validation precedes the backend check, same order as when enabled
    let result = client()
        .avatars()
        .upload(vec![0; 16], "doc.pdf", "application/pdf", "user-1")
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_session_initializes_to_anonymous_ready() {
    let client = client();
    client.session().initialize().await;

    assert_eq!(
        client.session().lifecycle().await,
        teekdocs::auth::Lifecycle::Ready
    );
    assert!(!client.session().is_logged_in().await);
    assert_eq!(client.session().display_name().await, "User");
}

#[tokio::test]
async fn test_login_without_fallback_users_fails_cleanly() {
    let result = client().session().login("admin", "admin123").await;
    match result {
        Err(AppError::Auth(message)) => {
            assert_eq!(message, "Incorrect email or password");
        }
        other => panic!("expected auth error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_fallback_credentials_open_the_private_gate() {
    let mut config = AppConfig::default();
    config.auth.fallback_users = vec![FallbackUser {
        username: "admin".to_string(),
        password: "admin123".to_string(),
        role: "admin".to_string(),
    }];
    let client = SiteClient::new(config);
    let gate = client.gate();

    assert!(!gate.validate().await);
    assert_eq!(
        gate.login("admin", "admin123").await,
        LoginOutcome::Success
    );
    assert!(gate.validate().await);

    client.session().logout().await;
    assert!(!gate.validate().await);
}

#[tokio::test]
async fn test_registration_is_closed_without_a_backend() {
    let result = client()
        .session()
        .register("a@example.com", "secret1", "secret1")
        .await;
    match result {
        Err(AppError::Auth(message)) => {
            assert_eq!(message, "Registration is currently closed");
        }
        other => panic!("expected auth error, got {:?}", other.err()),
    }
}
