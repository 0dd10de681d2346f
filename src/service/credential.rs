//! Credential service
//!
//! Hands decrypted session payloads to sync jobs.

use std::sync::Arc;

use crate::auth::CredentialVault;
use crate::data::Database;
use crate::error::AppError;
use crate::metrics::CREDENTIAL_FAILURES_TOTAL;

/// Credential service
pub struct CredentialService {
    db: Arc<Database>,
    vault: Arc<CredentialVault>,
}

impl CredentialService {
    /// Create new credential service
    pub fn new(db: Arc<Database>, vault: Arc<CredentialVault>) -> Self {
        Self { db, vault }
    }

    /// Plaintext session payload for the account's syncable Bluesky profile
    ///
    /// Missing account, missing profile, disabled sync and missing payload
    /// all yield the same `NotFound`.
    ///
    /// # Errors
    /// `Decryption` if the stored payload cannot be read back
    pub async fn retrieve_for_sync(&self, account_id: i64) -> Result<String, AppError> {
        let profile = self
            .db
            .get_syncable_bluesky_profile(account_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let stored = profile
            .encrypted_session_data
            .as_deref()
            .ok_or(AppError::NotFound)?;

        self.vault.decrypt(stored).inspect_err(|error| {
            CREDENTIAL_FAILURES_TOTAL
                .with_label_values(&["decrypt"])
                .inc();
            tracing::warn!(
                account_id,
                profile_id = profile.id,
                error = %error,
                "Stored session data could not be decrypted"
            );
        })
    }
}
