//! Following service
//!
//! Reconciles an account's stored Bluesky follow graph with snapshots
//! fetched by the caller, and links followed handles to internal accounts.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::AccountLocks;
use crate::data::{Account, Database, FollowSnapshotEntry, Following, SyncSummary};
use crate::error::AppError;
use crate::metrics::{FOLLOWING_SYNC_ENTRIES_TOTAL, observe_following_sync};

/// Following row joined with the internal account it links to
#[derive(Debug, Clone)]
pub struct FollowingView {
    pub following: Following,
    pub followed: Option<Account>,
}

impl FollowingView {
    pub fn is_linked(&self) -> bool {
        self.following.is_linked()
    }

    /// Linked artist currently accepts commissions
    pub fn is_open_for_commissions(&self) -> bool {
        self.followed
            .as_ref()
            .is_some_and(|account| account.is_artist() && account.open_for_commissions)
    }
}

fn normalize_entry(entry: &FollowSnapshotEntry) -> Result<FollowSnapshotEntry, AppError> {
    let handle = entry.handle.trim();
    if handle.is_empty() {
        return Err(AppError::Validation(
            "every following entry needs a handle".to_string(),
        ));
    }
    let optional = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Ok(FollowSnapshotEntry {
        handle: handle.to_string(),
        did: optional(&entry.did),
        display_name: optional(&entry.display_name),
    })
}

fn status_label<T>(result: &Result<T, AppError>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}

/// Following service
pub struct FollowingService {
    db: Arc<Database>,
    locks: AccountLocks,
}

impl FollowingService {
    /// Create new following service
    pub fn new(db: Arc<Database>, locks: AccountLocks) -> Self {
        Self { db, locks }
    }

    /// Replace the account's following rows with `snapshot`
    ///
    /// An empty snapshot clears the graph. Duplicate handles keep their
    /// first occurrence.
    ///
    /// # Errors
    /// `Validation` for a missing snapshot or a blank handle, `NotFound`
    /// for an unknown account. Nothing is written on error.
    pub async fn sync_following(
        &self,
        account_id: i64,
        snapshot: Option<&[FollowSnapshotEntry]>,
    ) -> Result<SyncSummary, AppError> {
        let snapshot = snapshot.ok_or_else(|| {
            AppError::Validation("following list is required".to_string())
        })?;
        let entries = snapshot
            .iter()
            .map(normalize_entry)
            .collect::<Result<Vec<_>, _>>()?;

        let _guard = self.locks.acquire(account_id).await;
        let started = Instant::now();
        let result = self
            .db
            .replace_following(account_id, &entries, Utc::now())
            .await;
        observe_following_sync("full", status_label(&result), started.elapsed());

        let summary = result?;
        FOLLOWING_SYNC_ENTRIES_TOTAL
            .with_label_values(&["linked"])
            .inc_by(summary.linked_count as u64);
        FOLLOWING_SYNC_ENTRIES_TOTAL
            .with_label_values(&["unlinked"])
            .inc_by((summary.synced_count - summary.linked_count) as u64);
        tracing::info!(
            account_id,
            synced = summary.synced_count,
            linked = summary.linked_count,
            "Synced Bluesky following"
        );

        Ok(summary)
    }

    /// Create or refresh one following row, leaving the rest untouched
    pub async fn upsert_single_follow(
        &self,
        account_id: i64,
        handle: &str,
        did: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<Following, AppError> {
        let entry = normalize_entry(&FollowSnapshotEntry {
            handle: handle.to_string(),
            did: did.map(str::to_string),
            display_name: display_name.map(str::to_string),
        })?;

        let _guard = self.locks.acquire(account_id).await;
        let started = Instant::now();
        let result = self
            .db
            .upsert_following(account_id, &entry, Utc::now())
            .await;
        observe_following_sync("single", status_label(&result), started.elapsed());

        let following = result?;
        tracing::debug!(
            account_id,
            handle = %following.bluesky_handle,
            linked = following.is_linked(),
            "Upserted following"
        );
        Ok(following)
    }

    /// The account's following rows with their linked accounts
    ///
    /// With `open_for_commissions_only`, only rows linked to artists open
    /// for commissions are returned.
    pub async fn following(
        &self,
        account_id: i64,
        open_for_commissions_only: bool,
    ) -> Result<Vec<FollowingView>, AppError> {
        if self.db.get_account_by_id(account_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let rows = if open_for_commissions_only {
            self.db.get_following_open_for_commissions(account_id).await?
        } else {
            self.db.get_following(account_id).await?
        };

        let mut linked_ids: Vec<i64> = rows.iter().filter_map(|row| row.followed_id).collect();
        linked_ids.sort_unstable();
        linked_ids.dedup();

        let accounts: HashMap<i64, Account> = self
            .db
            .get_accounts_by_ids(&linked_ids)
            .await?
            .into_iter()
            .map(|account| (account.id, account))
            .collect();

        Ok(rows
            .into_iter()
            .map(|following| {
                let followed = following
                    .followed_id
                    .and_then(|id| accounts.get(&id).cloned());
                FollowingView {
                    following,
                    followed,
                }
            })
            .collect())
    }
}
