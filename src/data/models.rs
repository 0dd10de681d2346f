//! Data models
//!
//! Rust structs representing identity store rows.
//! Rows use SQLite integer IDs and chrono timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform name under which Bluesky identities are stored
pub const BLUESKY_PLATFORM: &str = "bluesky";

// =============================================================================
// Account
// =============================================================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    User,
    Artist,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Artist => "artist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "artist" => Some(Self::Artist),
            _ => None,
        }
    }
}

/// Internal identity (user or artist)
///
/// Artist-only state (`verified`, `open_for_commissions`) lives on the same
/// row and stays false for plain users.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// "user" or "artist"
    pub role: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_pic_path: Option<String>,
    /// Derived from verified Bluesky profiles (artists only)
    pub verified: bool,
    pub open_for_commissions: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_artist(&self) -> bool {
        AccountRole::parse(&self.role) == Some(AccountRole::Artist)
    }
}

/// Data needed to create an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub role: AccountRole,
    pub email: Option<String>,
    pub bio: Option<String>,
}

impl NewAccount {
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: AccountRole::User,
            email: None,
            bio: None,
        }
    }

    pub fn artist(username: impl Into<String>) -> Self {
        Self {
            role: AccountRole::Artist,
            ..Self::user(username)
        }
    }
}

/// Artist directory filter; `None` fields do not constrain
#[derive(Debug, Clone, Default)]
pub struct ArtistFilter {
    pub verified: Option<bool>,
    pub open_for_commissions: Option<bool>,
}

// =============================================================================
// Social profiles
// =============================================================================

/// External social identity attached to an account
#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialProfile {
    pub id: i64,
    pub account_id: i64,
    /// Lowercase platform name (e.g. "bluesky")
    pub platform: String,
    /// External handle
    pub username: String,
    pub profile_url: Option<String>,
    pub is_verified: bool,
    /// External DID
    pub did: Option<String>,
    pub display_name: Option<String>,
    /// Base64 AES-GCM blob; never serialized to clients
    #[serde(skip_serializing)]
    pub encrypted_session_data: Option<String>,
    pub can_sync: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialProfile {
    pub fn is_bluesky(&self) -> bool {
        self.platform.eq_ignore_ascii_case(BLUESKY_PLATFORM)
    }

    /// Counts toward an artist's verified flag
    pub fn is_verified_bluesky(&self) -> bool {
        self.is_bluesky() && self.is_verified
    }
}

impl std::fmt::Debug for SocialProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialProfile")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("platform", &self.platform)
            .field("username", &self.username)
            .field("is_verified", &self.is_verified)
            .field("did", &self.did)
            .field("can_sync", &self.can_sync)
            .finish_non_exhaustive()
    }
}

/// Verified external identity written by the link operation
#[derive(Debug, Clone)]
pub struct BlueskyLink {
    pub handle: String,
    pub did: String,
    pub display_name: Option<String>,
    pub profile_url: String,
    /// Encrypted session payload; `None` disables sync
    pub encrypted_session_data: Option<String>,
}

/// Declared profile written by the plain creation path
#[derive(Debug, Clone)]
pub struct NewSocialProfile {
    pub platform: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub is_verified: bool,
}

/// Result of a profile write, with the artist flag after the write
#[derive(Debug, Clone)]
pub struct ProfileChange {
    pub profile: SocialProfile,
    pub verified_before: bool,
    pub verified_after: bool,
}

// =============================================================================
// Following
// =============================================================================

/// "Account follows Bluesky handle", optionally linked to an internal account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Following {
    pub id: i64,
    pub follower_id: i64,
    /// Internal account owning the handle, when known
    pub followed_id: Option<i64>,
    pub bluesky_handle: String,
    pub bluesky_did: Option<String>,
    pub bluesky_display_name: Option<String>,
    /// First time this row was created
    pub followed_at: DateTime<Utc>,
    /// Last reconciliation touching this row
    pub synced_at: DateTime<Utc>,
}

impl Following {
    pub fn is_linked(&self) -> bool {
        self.followed_id.is_some()
    }
}

/// One entry of an externally supplied follow list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSnapshotEntry {
    pub handle: String,
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl FollowSnapshotEntry {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            did: None,
            display_name: None,
        }
    }
}

/// Following row to persist as-is
#[derive(Debug, Clone)]
pub struct NewFollowing {
    pub follower_id: i64,
    pub followed_id: Option<i64>,
    pub bluesky_handle: String,
    pub bluesky_did: Option<String>,
    pub bluesky_display_name: Option<String>,
    pub followed_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

/// Counts returned by a full resync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub synced_count: usize,
    pub linked_count: usize,
}
