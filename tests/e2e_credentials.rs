//! E2E tests for session credential storage and retrieval

mod common;

use common::TestApp;
use copla_core::api::SessionDataResponse;
use copla_core::error::AppError;

const SESSION: &str = r#"{"did":"did:plc:maya","accessJwt":"a","refreshJwt":"r"}"#;

#[tokio::test]
async fn test_session_round_trip_through_store() {
    let app = TestApp::new().await;
    let artist = app.create_artist("maya").await;

    let outcome = app
        .state
        .verification()
        .link_external_identity(
            artist.id,
            "maya.bsky.social",
            "did:plc:maya",
            None,
            Some(SESSION),
        )
        .await
        .unwrap();
    assert!(outcome.sync_enabled);

    // Stored payload is not the plaintext
    let profiles = app.state.db.get_social_profiles(artist.id).await.unwrap();
    let stored = profiles[0].encrypted_session_data.as_deref().unwrap();
    assert!(!stored.contains("accessJwt"));

    let session = app.state.credentials().retrieve_for_sync(artist.id).await.unwrap();
    let body = serde_json::to_value(SessionDataResponse::new(session)).unwrap();
    assert_eq!(body["sessionData"], SESSION);
}

#[tokio::test]
async fn test_relink_without_session_disables_sync() {
    let app = TestApp::new().await;
    let user = app.create_user("sam").await;
    let verification = app.state.verification();

    verification
        .link_external_identity(user.id, "sam.bsky.social", "did:plc:sam", None, Some(SESSION))
        .await
        .unwrap();
    let outcome = verification
        .link_external_identity(user.id, "sam.bsky.social", "did:plc:sam", None, None)
        .await
        .unwrap();
    assert!(!outcome.sync_enabled);

    let result = app.state.credentials().retrieve_for_sync(user.id).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_oversized_session_links_without_sync() {
    let app = TestApp::new().await;
    let artist = app.create_artist("maya").await;
    let oversized = "x".repeat(8192);

    let outcome = app
        .state
        .verification()
        .link_external_identity(
            artist.id,
            "maya.bsky.social",
            "did:plc:maya",
            None,
            Some(&oversized),
        )
        .await
        .unwrap();

    assert!(!outcome.sync_enabled);
    assert!(app.account(artist.id).await.verified);
    assert!(matches!(
        app.state.credentials().retrieve_for_sync(artist.id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_key_rotation_requires_relink() {
    let app = TestApp::with_key_seed(1).await;
    let user = app.create_user("sam").await;
    app.state
        .verification()
        .link_external_identity(user.id, "sam.bsky.social", "did:plc:sam", None, Some(SESSION))
        .await
        .unwrap();

    let rotated = app.reopen_with_key_seed(2).await;
    let result = rotated.credentials().retrieve_for_sync(user.id).await;
    assert!(matches!(result, Err(AppError::Decryption(_))));

    // Re-linking under the new key restores sync
    rotated
        .verification()
        .link_external_identity(user.id, "sam.bsky.social", "did:plc:sam", None, Some(SESSION))
        .await
        .unwrap();
    assert_eq!(
        rotated.credentials().retrieve_for_sync(user.id).await.unwrap(),
        SESSION
    );
}
