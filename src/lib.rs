//! Copla core - identity linking and follow-graph synchronization
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    API Types (serde)                         │
//! │  - Link / sync request bodies                               │
//! │  - Following and profile responses                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Verification state                                       │
//! │  - Following sync and link resolution                       │
//! │  - Session credential handoff                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - AES-256-GCM session vault                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: Wire DTOs
//! - `service`: Business logic layer
//! - `data`: Identity store
//! - `auth`: Session credential vault
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Session credential vault
    pub vault: Arc<auth::CredentialVault>,

    /// Per-account mutation locks
    pub locks: service::AccountLocks,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the credential vault from the configured key
    /// 2. Connect to SQLite database and run migrations
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Credential vault
        let vault = auth::CredentialVault::new(&config.app.encryption)?;

        // 2. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            vault: Arc::new(vault),
            locks: service::AccountLocks::new(),
        })
    }

    pub fn verification(&self) -> service::VerificationService {
        service::VerificationService::new(
            self.db.clone(),
            self.vault.clone(),
            self.locks.clone(),
            self.config.bluesky.clone(),
        )
    }

    pub fn credentials(&self) -> service::CredentialService {
        service::CredentialService::new(self.db.clone(), self.vault.clone())
    }

    pub fn following(&self) -> service::FollowingService {
        service::FollowingService::new(self.db.clone(), self.locks.clone())
    }

    pub fn resolver(&self) -> service::LinkResolver {
        service::LinkResolver::new(self.db.clone())
    }
}
