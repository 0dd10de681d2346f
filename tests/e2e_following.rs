//! E2E tests for Bluesky following sync

mod common;

use common::TestApp;
use copla_core::api::{FollowingResponse, SyncFollowingRequest};
use copla_core::data::{FollowSnapshotEntry, SyncSummary};
use copla_core::error::AppError;
use std::collections::HashSet;
use std::time::Duration;

fn snapshot(handles: &[&str]) -> Vec<FollowSnapshotEntry> {
    handles.iter().map(|h| FollowSnapshotEntry::new(*h)).collect()
}

#[tokio::test]
async fn test_full_resync_replaces_previous_snapshot() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;
    let following = app.state.following();

    following
        .sync_following(fan.id, Some(&snapshot(&["a.bsky.social", "b.bsky.social"])))
        .await
        .unwrap();
    let before = app
        .state
        .db
        .get_following_by_handle(fan.id, "b.bsky.social")
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    following
        .sync_following(fan.id, Some(&snapshot(&["b.bsky.social", "c.bsky.social"])))
        .await
        .unwrap();

    let rows = app.state.db.get_following(fan.id).await.unwrap();
    let handles: Vec<_> = rows.iter().map(|r| r.bluesky_handle.as_str()).collect();
    assert_eq!(handles, vec!["b.bsky.social", "c.bsky.social"]);

    // B was recreated, not carried over
    let after = &rows[0];
    assert_ne!(after.id, before.id);
    assert!(after.followed_at > before.followed_at);
}

#[tokio::test]
async fn test_sync_auto_links_registered_artist() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;
    let artist = app.create_linked_artist("maya", "maya.bsky.social").await;

    let summary = app
        .state
        .following()
        .sync_following(
            fan.id,
            Some(&snapshot(&["maya.bsky.social", "stranger.bsky.social"])),
        )
        .await
        .unwrap();
    assert_eq!(
        summary,
        SyncSummary {
            synced_count: 2,
            linked_count: 1
        }
    );

    let views = app.state.following().following(fan.id, false).await.unwrap();
    let body: Vec<FollowingResponse> = views.iter().map(FollowingResponse::from).collect();
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value[0]["coplaUser"]["id"], artist.id);
    assert_eq!(value[1]["isLinked"], false);
}

#[tokio::test]
async fn test_empty_snapshot_returns_zero_counts() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;

    let request: SyncFollowingRequest = serde_json::from_str(r#"{"following":[]}"#).unwrap();
    let summary = app
        .state
        .following()
        .sync_following(fan.id, request.snapshot())
        .await
        .unwrap();
    assert_eq!(summary, SyncSummary::default());
}

#[tokio::test]
async fn test_missing_snapshot_is_rejected_without_changes() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;
    let following = app.state.following();
    following
        .sync_following(fan.id, Some(&snapshot(&["a.bsky.social"])))
        .await
        .unwrap();

    let request: SyncFollowingRequest = serde_json::from_str("{}").unwrap();
    let result = following.sync_following(fan.id, request.snapshot()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(app.state.db.get_following(fan.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_handles_collapse() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;

    let mut entries = snapshot(&["a.bsky.social", "b.bsky.social"]);
    let mut duplicate = FollowSnapshotEntry::new("a.bsky.social");
    duplicate.display_name = Some("Second".to_string());
    entries.push(duplicate);

    let summary = app
        .state
        .following()
        .sync_following(fan.id, Some(&entries))
        .await
        .unwrap();
    assert_eq!(summary.synced_count, 2);

    let row = app
        .state
        .db
        .get_following_by_handle(fan.id, "a.bsky.social")
        .await
        .unwrap()
        .unwrap();
    assert!(row.bluesky_display_name.is_none());
}

#[tokio::test]
async fn test_handle_matching_is_case_sensitive() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;
    let artist = app.create_linked_artist("maya", "maya.bsky.social").await;

    let summary = app
        .state
        .following()
        .sync_following(fan.id, Some(&snapshot(&["Maya.bsky.social"])))
        .await
        .unwrap();
    assert_eq!(summary.linked_count, 0);

    let resolver = app.state.resolver();
    assert!(
        resolver
            .resolve_internal_account("Maya.bsky.social")
            .await
            .unwrap()
            .is_none()
    );
    let found = resolver
        .resolve_internal_account("maya.bsky.social")
        .await
        .unwrap();
    assert_eq!(found.map(|a| a.id), Some(artist.id));
}

#[tokio::test]
async fn test_upsert_single_follow_preserves_followed_at() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;
    let following = app.state.following();

    following
        .sync_following(fan.id, Some(&snapshot(&["a.bsky.social", "b.bsky.social"])))
        .await
        .unwrap();
    let original = app
        .state
        .db
        .get_following_by_handle(fan.id, "a.bsky.social")
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let updated = following
        .upsert_single_follow(fan.id, "a.bsky.social", Some("did:plc:a"), Some("A"))
        .await
        .unwrap();
    following
        .upsert_single_follow(fan.id, "c.bsky.social", None, None)
        .await
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.followed_at, original.followed_at);
    assert!(updated.synced_at > original.synced_at);
    assert_eq!(updated.bluesky_did.as_deref(), Some("did:plc:a"));
    assert_eq!(app.state.db.get_following(fan.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_sync_unknown_account_is_not_found() {
    let app = TestApp::new().await;
    let result = app
        .state
        .following()
        .sync_following(404, Some(&snapshot(&["a.bsky.social"])))
        .await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_concurrent_syncs_leave_one_snapshot() {
    let app = TestApp::new().await;
    let fan_id = app.create_user("fan").await.id;

    let first = snapshot(&["a.bsky.social", "b.bsky.social", "c.bsky.social"]);
    let second = snapshot(&["x.bsky.social", "y.bsky.social"]);

    let mut handles = Vec::new();
    for entries in [first.clone(), second.clone(), first.clone(), second.clone()] {
        let following = app.state.following();
        handles.push(tokio::spawn(async move {
            following.sync_following(fan_id, Some(&entries)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored: HashSet<String> = app
        .state
        .db
        .get_following(fan_id)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.bluesky_handle)
        .collect();
    let as_set = |entries: &[FollowSnapshotEntry]| -> HashSet<String> {
        entries.iter().map(|e| e.handle.clone()).collect()
    };
    assert!(stored == as_set(&first) || stored == as_set(&second));
}

#[tokio::test]
async fn test_timed_out_sync_leaves_later_writes_durable() {
    let app = TestApp::new().await;
    let fan = app.create_user("fan").await;

    let entries: Vec<_> = (0..20_000)
        .map(|i| FollowSnapshotEntry::new(format!("user{}.bsky.social", i)))
        .collect();
    let _ = tokio::time::timeout(
        Duration::from_millis(30),
        app.state.following().sync_following(fan.id, Some(&entries)),
    )
    .await;

    for i in 0..3 {
        app.create_user(&format!("later{}", i)).await;
    }
    let summary = app
        .state
        .following()
        .sync_following(fan.id, Some(&snapshot(&["a.bsky.social"])))
        .await
        .unwrap();
    assert_eq!(summary.synced_count, 1);

    // Another pool on the same file sees the writes
    let reopened = app.reopen_with_key_seed(7).await;
    for i in 0..3 {
        assert!(
            reopened
                .db
                .get_account_by_username(&format!("later{}", i))
                .await
                .unwrap()
                .is_some()
        );
    }
    assert_eq!(reopened.db.get_following(fan.id).await.unwrap().len(), 1);
}
