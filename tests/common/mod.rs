//! Common test utilities for E2E tests

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use copla_core::data::{Account, NewAccount};
use copla_core::{AppState, config};
use tempfile::TempDir;

/// Test application instance backed by a temporary database
pub struct TestApp {
    pub state: AppState,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Create a new test application with a fresh database
    pub async fn new() -> Self {
        Self::with_key_seed(7).await
    }

    /// Create a test application whose vault key is derived from `seed`
    pub async fn with_key_seed(seed: u8) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let state = AppState::new(test_config(db_path, seed)).await.unwrap();

        Self {
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Reopen the same database with another vault key
    pub async fn reopen_with_key_seed(&self, seed: u8) -> AppState {
        let db_path = self.state.config.database.path.clone();
        AppState::new(test_config(db_path, seed)).await.unwrap()
    }

    pub async fn create_user(&self, username: &str) -> Account {
        self.state
            .db
            .insert_account(&NewAccount::user(username))
            .await
            .unwrap()
    }

    pub async fn create_artist(&self, username: &str) -> Account {
        self.state
            .db
            .insert_account(&NewAccount::artist(username))
            .await
            .unwrap()
    }

    /// Create an artist with a verified Bluesky identity and no session
    pub async fn create_linked_artist(&self, username: &str, handle: &str) -> Account {
        let artist = self.create_artist(username).await;
        self.state
            .verification()
            .link_external_identity(
                artist.id,
                handle,
                &format!("did:plc:{}", username),
                None,
                None,
            )
            .await
            .unwrap();
        self.account(artist.id).await
    }

    /// Reload an account from the store
    pub async fn account(&self, account_id: i64) -> Account {
        self.state
            .db
            .get_account_by_id(account_id)
            .await
            .unwrap()
            .expect("account exists")
    }
}

/// Build a test configuration
pub fn test_config(db_path: std::path::PathBuf, key_seed: u8) -> config::AppConfig {
    config::AppConfig {
        database: config::DatabaseConfig { path: db_path },
        app: config::ApplicationConfig {
            environment: config::Environment::Development,
            encryption: config::EncryptionConfig {
                key: BASE64_STANDARD.encode([key_seed; config::ENCRYPTION_KEY_BYTES]),
                max_session_bytes: 4096,
            },
        },
        bluesky: config::BlueskyConfig::default(),
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}
