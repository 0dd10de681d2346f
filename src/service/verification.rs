//! Verification service
//!
//! Links Bluesky identities to accounts and keeps the artist `verified` flag
//! consistent with the account's verified Bluesky profiles.

use std::sync::Arc;

use super::AccountLocks;
use crate::auth::CredentialVault;
use crate::config::BlueskyConfig;
use crate::data::{
    Account, ArtistFilter, BLUESKY_PLATFORM, BlueskyLink, Database, NewSocialProfile,
    ProfileChange, SocialProfile,
};
use crate::error::AppError;
use crate::metrics::{
    CREDENTIAL_FAILURES_TOTAL, IDENTITY_LINKS_TOTAL, IDENTITY_UNLINKS_TOTAL,
    VERIFICATION_CHANGES_TOTAL,
};

fn required_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn record_verification_change(account_id: i64, change: &ProfileChange) {
    if change.verified_before == change.verified_after {
        return;
    }
    let state = if change.verified_after {
        "verified"
    } else {
        "unverified"
    };
    VERIFICATION_CHANGES_TOTAL.with_label_values(&[state]).inc();
    tracing::info!(account_id, state, "Artist verification changed");
}

/// Confirmation returned by a successful link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOutcome {
    pub profile_id: i64,
    /// `false` when no session was supplied or it could not be encrypted
    pub sync_enabled: bool,
}

/// Verification service
pub struct VerificationService {
    db: Arc<Database>,
    vault: Arc<CredentialVault>,
    locks: AccountLocks,
    bluesky: BlueskyConfig,
}

impl VerificationService {
    /// Create new verification service
    pub fn new(
        db: Arc<Database>,
        vault: Arc<CredentialVault>,
        locks: AccountLocks,
        bluesky: BlueskyConfig,
    ) -> Self {
        Self {
            db,
            vault,
            locks,
            bluesky,
        }
    }

    /// Attach a verified Bluesky identity to an account
    ///
    /// The session payload is optional. When it cannot be encrypted the
    /// link still succeeds, with sync disabled.
    ///
    /// # Errors
    /// `Validation` for a blank handle or DID, `NotFound` for an unknown
    /// account
    pub async fn link_external_identity(
        &self,
        account_id: i64,
        handle: &str,
        did: &str,
        display_name: Option<&str>,
        session_data: Option<&str>,
    ) -> Result<LinkOutcome, AppError> {
        let handle = required_text(handle, "handle")?;
        let did = required_text(did, "external id")?;

        let _guard = self.locks.acquire(account_id).await;

        let encrypted_session_data = match session_data.filter(|s| !s.trim().is_empty()) {
            Some(session) => match self.vault.encrypt(session) {
                Ok(encrypted) => Some(encrypted),
                Err(error) => {
                    CREDENTIAL_FAILURES_TOTAL
                        .with_label_values(&["encrypt"])
                        .inc();
                    tracing::warn!(
                        account_id,
                        handle = %handle,
                        error = %error,
                        "Failed to encrypt session data; linking without sync"
                    );
                    None
                }
            },
            None => None,
        };

        let link = BlueskyLink {
            handle: handle.to_string(),
            did: did.to_string(),
            display_name: normalize_optional_text(display_name),
            profile_url: self.bluesky.profile_url(handle),
            encrypted_session_data,
        };

        let change = self.db.link_bluesky_identity(account_id, &link).await?;
        let sync_enabled = change.profile.can_sync;

        IDENTITY_LINKS_TOTAL
            .with_label_values(&[if sync_enabled { "enabled" } else { "disabled" }])
            .inc();
        record_verification_change(account_id, &change);
        tracing::info!(
            account_id,
            profile_id = change.profile.id,
            handle = %handle,
            sync_enabled,
            "Linked Bluesky identity"
        );

        Ok(LinkOutcome {
            profile_id: change.profile.id,
            sync_enabled,
        })
    }

    /// Remove a social profile and re-derive the artist flag
    ///
    /// Platform and handle match case-insensitively.
    ///
    /// # Errors
    /// `NotFound` if the account has no such profile
    pub async fn unlink_external_identity(
        &self,
        account_id: i64,
        platform: &str,
        handle: &str,
    ) -> Result<SocialProfile, AppError> {
        let platform = required_text(platform, "platform")?;
        let handle = required_text(handle, "handle")?;

        let _guard = self.locks.acquire(account_id).await;

        let change = self
            .db
            .remove_social_profile(account_id, platform, handle)
            .await?
            .ok_or(AppError::NotFound)?;

        IDENTITY_UNLINKS_TOTAL
            .with_label_values(&[change.profile.platform.as_str()])
            .inc();
        record_verification_change(account_id, &change);
        tracing::info!(
            account_id,
            platform = %change.profile.platform,
            handle = %change.profile.username,
            "Unlinked social profile"
        );

        Ok(change.profile)
    }

    /// Create a declared profile without merging into existing ones
    ///
    /// # Errors
    /// `Conflict` if the exact platform/handle pair is already attached
    pub async fn add_social_profile(
        &self,
        account_id: i64,
        platform: &str,
        handle: &str,
        is_verified: bool,
    ) -> Result<SocialProfile, AppError> {
        let platform = required_text(platform, "platform")?.to_ascii_lowercase();
        let handle = required_text(handle, "handle")?;

        let profile_url = (platform == BLUESKY_PLATFORM).then(|| self.bluesky.profile_url(handle));
        let new_profile = NewSocialProfile {
            platform,
            username: handle.to_string(),
            profile_url,
            is_verified,
        };

        let _guard = self.locks.acquire(account_id).await;
        let change = self
            .db
            .insert_social_profile(account_id, &new_profile)
            .await?;

        record_verification_change(account_id, &change);
        tracing::debug!(
            account_id,
            profile_id = change.profile.id,
            platform = %change.profile.platform,
            "Added social profile"
        );

        Ok(change.profile)
    }

    /// Profiles attached to an account, oldest first
    pub async fn social_profiles(&self, account_id: i64) -> Result<Vec<SocialProfile>, AppError> {
        if self.db.get_account_by_id(account_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db.get_social_profiles(account_id).await
    }

    /// Artist directory listing
    pub async fn list_artists(&self, filter: &ArtistFilter) -> Result<Vec<Account>, AppError> {
        self.db.list_artists(filter).await
    }
}
