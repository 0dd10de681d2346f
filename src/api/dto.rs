//! Wire DTOs
//!
//! JSON request and response bodies exchanged with the web client.
//! Field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{Account, FollowSnapshotEntry, SocialProfile};
use crate::service::{FollowingView, LinkOutcome};

/// Body of a "link Bluesky account" request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBlueskyRequest {
    #[serde(default)]
    pub bluesky_did: String,
    #[serde(default)]
    pub bluesky_handle: String,
    #[serde(default)]
    pub bluesky_display_name: Option<String>,
    /// Opaque session JSON; enables sync when present
    #[serde(default)]
    pub session_data: Option<String>,
}

/// Body of a link confirmation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBlueskyResponse {
    pub message: String,
    pub profile_id: i64,
    pub sync_enabled: bool,
}

impl From<LinkOutcome> for LinkBlueskyResponse {
    fn from(outcome: LinkOutcome) -> Self {
        let message = if outcome.sync_enabled {
            "Bluesky account linked successfully"
        } else {
            "Bluesky account linked without sync"
        };
        Self {
            message: message.to_string(),
            profile_id: outcome.profile_id,
            sync_enabled: outcome.sync_enabled,
        }
    }
}

/// Body of a full following sync
///
/// `following` is optional on the wire so a missing list reaches the
/// service and is rejected there.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncFollowingRequest {
    #[serde(default)]
    pub following: Option<Vec<FollowSnapshotEntry>>,
}

impl SyncFollowingRequest {
    pub fn snapshot(&self) -> Option<&[FollowSnapshotEntry]> {
        self.following.as_deref()
    }
}

/// Decrypted session handed to the client-side sync job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDataResponse {
    pub session_data: String,
    pub message: String,
}

impl SessionDataResponse {
    pub fn new(session_data: String) -> Self {
        Self {
            session_data,
            message: "Session data retrieved for sync".to_string(),
        }
    }
}

/// Public view of a social profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProfileResponse {
    pub id: i64,
    pub platform: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub is_verified: bool,
}

impl From<&SocialProfile> for SocialProfileResponse {
    fn from(profile: &SocialProfile) -> Self {
        Self {
            id: profile.id,
            platform: profile.platform.clone(),
            username: profile.username.clone(),
            profile_url: profile.profile_url.clone(),
            is_verified: profile.is_verified,
        }
    }
}

/// Account summary embedded in following rows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummaryResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub bio: Option<String>,
    pub profile_pic_path: Option<String>,
    /// Artists only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl From<&Account> for AccountSummaryResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role.clone(),
            bio: account.bio.clone(),
            profile_pic_path: account.profile_pic_path.clone(),
            verified: account.is_artist().then_some(account.verified),
        }
    }
}

/// One followed Bluesky handle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingResponse {
    pub id: i64,
    pub bluesky_handle: String,
    pub bluesky_display_name: Option<String>,
    pub copla_user: Option<AccountSummaryResponse>,
    pub is_linked: bool,
    pub is_open_for_commissions: bool,
    pub followed_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

impl From<&FollowingView> for FollowingResponse {
    fn from(view: &FollowingView) -> Self {
        Self {
            id: view.following.id,
            bluesky_handle: view.following.bluesky_handle.clone(),
            bluesky_display_name: view.following.bluesky_display_name.clone(),
            copla_user: view.followed.as_ref().map(AccountSummaryResponse::from),
            is_linked: view.is_linked(),
            is_open_for_commissions: view.is_open_for_commissions(),
            followed_at: view.following.followed_at,
            synced_at: view.following.synced_at,
        }
    }
}
