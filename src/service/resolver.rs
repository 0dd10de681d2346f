//! Link resolver
//!
//! Maps Bluesky handles to internal accounts.

use std::sync::Arc;

use crate::data::{Account, Database};
use crate::error::AppError;

/// Link resolver
pub struct LinkResolver {
    db: Arc<Database>,
}

impl LinkResolver {
    /// Create new link resolver
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Account owning a Bluesky profile with exactly this handle
    ///
    /// Matching is case-sensitive. When several accounts declare the same
    /// handle, the oldest profile wins.
    pub async fn resolve_internal_account(&self, handle: &str) -> Result<Option<Account>, AppError> {
        if handle.is_empty() {
            return Ok(None);
        }
        self.db.find_account_by_bluesky_handle(handle).await
    }
}
