//! SQLite database operations
//!
//! All identity store access goes through this module.
//! Multi-row operations run inside `BEGIN IMMEDIATE` transactions so that
//! either every row change commits or none does.

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Row counts reported at startup
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub accounts: i64,
    pub social_profiles: i64,
    pub following: i64,
}

fn map_unique_violation(error: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Conflict(message())
        }
        _ => AppError::Database(error),
    }
}

/// Pool connection holding an open `BEGIN IMMEDIATE` transaction.
///
/// Dropped before `finish` (e.g. a cancelled caller), the connection is
/// closed instead of returned to the pool, and SQLite rolls back.
struct ImmediateTransaction {
    conn: PoolConnection<Sqlite>,
    finished: bool,
}

impl ImmediateTransaction {
    async fn begin(pool: &SqlitePool) -> Result<Self, AppError> {
        let mut tx = Self {
            conn: pool.acquire().await?,
            finished: false,
        };
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *tx.conn).await?;
        Ok(tx)
    }

    /// Commit on success, roll back on failure.
    async fn finish<T>(mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                if let Err(error) = sqlx::query("COMMIT").execute(&mut *self.conn).await {
                    if sqlx::query("ROLLBACK").execute(&mut *self.conn).await.is_ok() {
                        self.finished = true;
                    }
                    return Err(error.into());
                }
                self.finished = true;
                Ok(value)
            }
            Err(error) => match sqlx::query("ROLLBACK").execute(&mut *self.conn).await {
                Ok(_) => {
                    self.finished = true;
                    Err(error)
                }
                Err(rollback_error) => {
                    tracing::error!(error = %rollback_error, "Failed to roll back transaction");
                    Err(error)
                }
            },
        }
    }
}

impl Deref for ImmediateTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for ImmediateTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for ImmediateTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Transaction dropped before completion; discarding connection");
            self.conn.close_on_drop();
        }
    }
}

async fn fetch_account(conn: &mut SqliteConnection, account_id: i64) -> Result<Account, AppError> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn set_artist_verified(
    conn: &mut SqliteConnection,
    account_id: i64,
    verified: bool,
) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET verified = ? WHERE id = ? AND role = 'artist'")
        .bind(verified)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn has_verified_bluesky_profile(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM social_profiles
            WHERE account_id = ? AND platform = ? COLLATE NOCASE AND is_verified = 1
        )
        "#,
    )
    .bind(account_id)
    .bind(BLUESKY_PLATFORM)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

/// Account owning the Bluesky handle (exact, case-sensitive match).
async fn resolve_bluesky_handle(
    conn: &mut SqliteConnection,
    handle: &str,
) -> Result<Option<i64>, AppError> {
    let account_id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT account_id FROM social_profiles
        WHERE platform = ? AND username = ?
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(BLUESKY_PLATFORM)
    .bind(handle)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(account_id)
}

/// Resolve a handle inside a batch; lookup failures count as unlinked.
async fn resolve_or_unlinked(conn: &mut SqliteConnection, handle: &str) -> Option<i64> {
    match resolve_bluesky_handle(conn, handle).await {
        Ok(account_id) => account_id,
        Err(error) => {
            tracing::warn!(
                handle = %handle,
                error = %error,
                "Failed to resolve Bluesky handle; leaving following unlinked"
            );
            None
        }
    }
}

async fn insert_following_row(
    conn: &mut SqliteConnection,
    following: &NewFollowing,
) -> Result<Following, AppError> {
    sqlx::query_as::<_, Following>(
        r#"
        INSERT INTO following (
            follower_id, followed_id, bluesky_handle, bluesky_did,
            bluesky_display_name, followed_at, synced_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(following.follower_id)
    .bind(following.followed_id)
    .bind(&following.bluesky_handle)
    .bind(&following.bluesky_did)
    .bind(&following.bluesky_display_name)
    .bind(following.followed_at)
    .bind(following.synced_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|error| {
        map_unique_violation(error, || {
            format!(
                "already following {} for this account",
                following.bluesky_handle
            )
        })
    })
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Row counts for startup logging and gauges
    pub async fn get_store_stats(&self) -> Result<StoreStats, AppError> {
        let (accounts, social_profiles, following) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM accounts),
                (SELECT COUNT(*) FROM social_profiles),
                (SELECT COUNT(*) FROM following)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            accounts,
            social_profiles,
            following,
        })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account
    ///
    /// # Errors
    /// `Conflict` if the username is taken
    pub async fn insert_account(&self, account: &NewAccount) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, role, email, bio, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&account.username)
        .bind(account.role.as_str())
        .bind(&account.email)
        .bind(&account.bio)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            map_unique_violation(error, || {
                format!("username {} is already taken", account.username)
            })
        })
    }

    pub async fn get_account_by_id(&self, account_id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get multiple accounts by ID (batch operation to avoid N+1)
    pub async fn get_accounts_by_ids(&self, ids: &[i64]) -> Result<Vec<Account>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut all_accounts = Vec::new();

        // SQLite limits bound parameters per statement
        for chunk in ids.chunks(100) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");

            let query = format!("SELECT * FROM accounts WHERE id IN ({})", placeholders);

            let mut query_builder = sqlx::query_as::<_, Account>(&query);
            for id in chunk {
                query_builder = query_builder.bind(id);
            }

            let accounts = query_builder.fetch_all(&self.pool).await?;
            all_accounts.extend(accounts);
        }

        Ok(all_accounts)
    }

    /// Delete an account; profiles and owned following rows cascade,
    /// following rows pointing at it become unlinked.
    ///
    /// # Returns
    /// `true` if a row was deleted
    pub async fn delete_account(&self, account_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Toggle the artist's commission availability.
    ///
    /// # Returns
    /// `false` if no artist with this ID exists
    pub async fn set_open_for_commissions(
        &self,
        account_id: i64,
        open: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE accounts SET open_for_commissions = ? WHERE id = ? AND role = 'artist'",
        )
        .bind(open)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List artists matching the filter, ordered by username
    pub async fn list_artists(&self, filter: &ArtistFilter) -> Result<Vec<Account>, AppError> {
        let mut query_builder =
            QueryBuilder::<Sqlite>::new("SELECT * FROM accounts WHERE role = 'artist'");
        if let Some(verified) = filter.verified {
            query_builder.push(" AND verified = ").push_bind(verified);
        }
        if let Some(open) = filter.open_for_commissions {
            query_builder
                .push(" AND open_for_commissions = ")
                .push_bind(open);
        }
        query_builder.push(" ORDER BY username ASC");

        let artists = query_builder
            .build_query_as::<Account>()
            .fetch_all(&self.pool)
            .await?;

        Ok(artists)
    }

    // =========================================================================
    // Social profiles
    // =========================================================================

    /// All profiles of an account, oldest first
    pub async fn get_social_profiles(
        &self,
        account_id: i64,
    ) -> Result<Vec<SocialProfile>, AppError> {
        let profiles = sqlx::query_as::<_, SocialProfile>(
            "SELECT * FROM social_profiles WHERE account_id = ? ORDER BY id ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    /// Upsert the account's Bluesky profile from a verified identity and
    /// mark an artist owner verified.
    ///
    /// The profile updated is the one already carrying `link.handle`, else
    /// the oldest Bluesky profile; a new one is created when none exists.
    pub async fn link_bluesky_identity(
        &self,
        account_id: i64,
        link: &BlueskyLink,
    ) -> Result<ProfileChange, AppError> {
        let mut conn = ImmediateTransaction::begin(&self.pool).await?;

        let result: Result<ProfileChange, AppError> = async {
            let account = fetch_account(&mut conn, account_id).await?;
            let now = Utc::now();
            let can_sync = link.encrypted_session_data.is_some();

            let existing = sqlx::query_as::<_, SocialProfile>(
                r#"
                SELECT * FROM social_profiles
                WHERE account_id = ? AND platform = ?
                ORDER BY (username = ?) DESC, id ASC
                LIMIT 1
                "#,
            )
            .bind(account_id)
            .bind(BLUESKY_PLATFORM)
            .bind(&link.handle)
            .fetch_optional(&mut *conn)
            .await?;

            let profile = match existing {
                Some(existing) => {
                    sqlx::query_as::<_, SocialProfile>(
                        r#"
                        UPDATE social_profiles
                        SET username = ?, profile_url = ?, did = ?, display_name = ?,
                            is_verified = 1, encrypted_session_data = ?, can_sync = ?,
                            updated_at = ?
                        WHERE id = ?
                        RETURNING *
                        "#,
                    )
                    .bind(&link.handle)
                    .bind(&link.profile_url)
                    .bind(&link.did)
                    .bind(&link.display_name)
                    .bind(&link.encrypted_session_data)
                    .bind(can_sync)
                    .bind(now)
                    .bind(existing.id)
                    .fetch_one(&mut *conn)
                    .await?
                }
                None => {
                    sqlx::query_as::<_, SocialProfile>(
                        r#"
                        INSERT INTO social_profiles (
                            account_id, platform, username, profile_url, is_verified,
                            did, display_name, encrypted_session_data, can_sync,
                            created_at, updated_at
                        ) VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?)
                        RETURNING *
                        "#,
                    )
                    .bind(account_id)
                    .bind(BLUESKY_PLATFORM)
                    .bind(&link.handle)
                    .bind(&link.profile_url)
                    .bind(&link.did)
                    .bind(&link.display_name)
                    .bind(&link.encrypted_session_data)
                    .bind(can_sync)
                    .bind(now)
                    .bind(now)
                    .fetch_one(&mut *conn)
                    .await?
                }
            };

            let verified_after = if account.is_artist() {
                set_artist_verified(&mut conn, account_id, true).await?;
                true
            } else {
                account.verified
            };

            Ok(ProfileChange {
                profile,
                verified_before: account.verified,
                verified_after,
            })
        }
        .await;

        conn.finish(result).await
    }

    /// Create a profile without merging into an existing one.
    ///
    /// The platform name is stored trimmed and lowercased.
    ///
    /// # Errors
    /// `Conflict` if the account already has this platform/handle pair
    pub async fn insert_social_profile(
        &self,
        account_id: i64,
        profile: &NewSocialProfile,
    ) -> Result<ProfileChange, AppError> {
        let platform = profile.platform.trim().to_ascii_lowercase();
        let mut conn = ImmediateTransaction::begin(&self.pool).await?;

        let result: Result<ProfileChange, AppError> = async {
            let account = fetch_account(&mut conn, account_id).await?;
            let now = Utc::now();

            let inserted = sqlx::query_as::<_, SocialProfile>(
                r#"
                INSERT INTO social_profiles (
                    account_id, platform, username, profile_url, is_verified,
                    can_sync, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, 0, ?, ?)
                RETURNING *
                "#,
            )
            .bind(account_id)
            .bind(&platform)
            .bind(&profile.username)
            .bind(&profile.profile_url)
            .bind(profile.is_verified)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await
            .map_err(|error| {
                map_unique_violation(error, || {
                    format!(
                        "{} profile {} is already attached to this account",
                        platform, profile.username
                    )
                })
            })?;

            let verified_after = if account.is_artist() && inserted.is_verified_bluesky() {
                set_artist_verified(&mut conn, account_id, true).await?;
                true
            } else {
                account.verified
            };

            Ok(ProfileChange {
                profile: inserted,
                verified_before: account.verified,
                verified_after,
            })
        }
        .await;

        conn.finish(result).await
    }

    /// Remove a profile (case-insensitive platform and handle) and
    /// re-derive the artist's verified flag from the remaining profiles.
    ///
    /// # Returns
    /// `None` if no profile matched
    pub async fn remove_social_profile(
        &self,
        account_id: i64,
        platform: &str,
        handle: &str,
    ) -> Result<Option<ProfileChange>, AppError> {
        let mut conn = ImmediateTransaction::begin(&self.pool).await?;

        let result: Result<Option<ProfileChange>, AppError> = async {
            let account = fetch_account(&mut conn, account_id).await?;

            let profile = sqlx::query_as::<_, SocialProfile>(
                r#"
                SELECT * FROM social_profiles
                WHERE account_id = ?
                  AND platform = ? COLLATE NOCASE
                  AND username = ? COLLATE NOCASE
                ORDER BY id ASC
                LIMIT 1
                "#,
            )
            .bind(account_id)
            .bind(platform)
            .bind(handle)
            .fetch_optional(&mut *conn)
            .await?;

            let Some(profile) = profile else {
                return Ok(None);
            };

            sqlx::query("DELETE FROM social_profiles WHERE id = ?")
                .bind(profile.id)
                .execute(&mut *conn)
                .await?;

            let mut verified_after = account.verified;
            if account.is_artist()
                && profile.is_verified_bluesky()
                && !has_verified_bluesky_profile(&mut conn, account_id).await?
            {
                set_artist_verified(&mut conn, account_id, false).await?;
                verified_after = false;
            }

            Ok(Some(ProfileChange {
                profile,
                verified_before: account.verified,
                verified_after,
            }))
        }
        .await;

        conn.finish(result).await
    }

    /// Bluesky profile holding a usable session payload
    ///
    /// Requires `is_verified`, `can_sync` and a stored payload.
    pub async fn get_syncable_bluesky_profile(
        &self,
        account_id: i64,
    ) -> Result<Option<SocialProfile>, AppError> {
        let profile = sqlx::query_as::<_, SocialProfile>(
            r#"
            SELECT * FROM social_profiles
            WHERE account_id = ? AND platform = ?
              AND is_verified = 1 AND can_sync = 1
              AND encrypted_session_data IS NOT NULL
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .bind(BLUESKY_PLATFORM)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Account owning a Bluesky profile with exactly this handle
    pub async fn find_account_by_bluesky_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.* FROM accounts a
            JOIN social_profiles sp ON sp.account_id = a.id
            WHERE sp.platform = ? AND sp.username = ?
            ORDER BY sp.id ASC
            LIMIT 1
            "#,
        )
        .bind(BLUESKY_PLATFORM)
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    // =========================================================================
    // Following
    // =========================================================================

    /// Replace every following row of `follower_id` with `entries`.
    ///
    /// Rows are recreated in input order with `followed_at = synced_at`.
    /// Duplicate handles keep their first occurrence.
    pub async fn replace_following(
        &self,
        follower_id: i64,
        entries: &[FollowSnapshotEntry],
        synced_at: DateTime<Utc>,
    ) -> Result<SyncSummary, AppError> {
        let mut conn = ImmediateTransaction::begin(&self.pool).await?;

        let result: Result<SyncSummary, AppError> = async {
            fetch_account(&mut conn, follower_id).await?;

            let removed = sqlx::query("DELETE FROM following WHERE follower_id = ?")
                .bind(follower_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();
            tracing::debug!(follower_id, removed, "Cleared following rows for resync");

            let mut summary = SyncSummary::default();
            let mut seen = HashSet::with_capacity(entries.len());

            for entry in entries {
                if !seen.insert(entry.handle.as_str()) {
                    tracing::debug!(
                        follower_id,
                        handle = %entry.handle,
                        "Skipping duplicate handle in following snapshot"
                    );
                    continue;
                }

                let followed_id = resolve_or_unlinked(&mut conn, &entry.handle).await;
                insert_following_row(
                    &mut conn,
                    &NewFollowing {
                        follower_id,
                        followed_id,
                        bluesky_handle: entry.handle.clone(),
                        bluesky_did: entry.did.clone(),
                        bluesky_display_name: entry.display_name.clone(),
                        followed_at: synced_at,
                        synced_at,
                    },
                )
                .await?;

                summary.synced_count += 1;
                if followed_id.is_some() {
                    summary.linked_count += 1;
                }
            }

            Ok(summary)
        }
        .await;

        conn.finish(result).await
    }

    /// Create or refresh a single following row without touching others.
    ///
    /// Existing rows keep `followed_at`; their link is only resolved when
    /// currently unset.
    pub async fn upsert_following(
        &self,
        follower_id: i64,
        entry: &FollowSnapshotEntry,
        synced_at: DateTime<Utc>,
    ) -> Result<Following, AppError> {
        let mut conn = ImmediateTransaction::begin(&self.pool).await?;

        let result: Result<Following, AppError> = async {
            fetch_account(&mut conn, follower_id).await?;

            let existing = sqlx::query_as::<_, Following>(
                "SELECT * FROM following WHERE follower_id = ? AND bluesky_handle = ?",
            )
            .bind(follower_id)
            .bind(&entry.handle)
            .fetch_optional(&mut *conn)
            .await?;

            let Some(existing) = existing else {
                let followed_id = resolve_or_unlinked(&mut conn, &entry.handle).await;
                return insert_following_row(
                    &mut conn,
                    &NewFollowing {
                        follower_id,
                        followed_id,
                        bluesky_handle: entry.handle.clone(),
                        bluesky_did: entry.did.clone(),
                        bluesky_display_name: entry.display_name.clone(),
                        followed_at: synced_at,
                        synced_at,
                    },
                )
                .await;
            };

            let followed_id = match existing.followed_id {
                Some(followed_id) => Some(followed_id),
                None => resolve_or_unlinked(&mut conn, &entry.handle).await,
            };

            let updated = sqlx::query_as::<_, Following>(
                r#"
                UPDATE following
                SET bluesky_did = ?, bluesky_display_name = ?, synced_at = ?, followed_id = ?
                WHERE id = ?
                RETURNING *
                "#,
            )
            .bind(&entry.did)
            .bind(&entry.display_name)
            .bind(synced_at)
            .bind(followed_id)
            .bind(existing.id)
            .fetch_one(&mut *conn)
            .await?;

            Ok(updated)
        }
        .await;

        conn.finish(result).await
    }

    /// Insert a following row as given
    ///
    /// # Errors
    /// `Conflict` if the follower already has a row for the handle
    pub async fn insert_following(&self, following: &NewFollowing) -> Result<Following, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_following_row(&mut conn, following).await
    }

    /// All following rows of an account in insertion order
    pub async fn get_following(&self, follower_id: i64) -> Result<Vec<Following>, AppError> {
        let rows = sqlx::query_as::<_, Following>(
            "SELECT * FROM following WHERE follower_id = ? ORDER BY id ASC",
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_following_by_handle(
        &self,
        follower_id: i64,
        handle: &str,
    ) -> Result<Option<Following>, AppError> {
        let row = sqlx::query_as::<_, Following>(
            "SELECT * FROM following WHERE follower_id = ? AND bluesky_handle = ?",
        )
        .bind(follower_id)
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Following rows linked to artists currently open for commissions
    pub async fn get_following_open_for_commissions(
        &self,
        follower_id: i64,
    ) -> Result<Vec<Following>, AppError> {
        let rows = sqlx::query_as::<_, Following>(
            r#"
            SELECT f.* FROM following f
            JOIN accounts a ON a.id = f.followed_id
            WHERE f.follower_id = ?
              AND a.role = 'artist'
              AND a.open_for_commissions = 1
            ORDER BY f.id ASC
            "#,
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
