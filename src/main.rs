//! Copla core binary entry point

use copla_core::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize metrics
/// 4. Initialize AppState (vault, database, migrations)
/// 5. Report store statistics
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let default_filter = format!("copla_core={},sqlx=warn", config.logging.level);
    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.clone().into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.clone().into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting Copla core...");
    if config.app.encryption.uses_development_key() {
        tracing::warn!("Using the development session encryption key");
    }

    // 3. Initialize metrics
    copla_core::metrics::init_metrics();

    tracing::info!(
        database = %config.database.path.display(),
        environment = ?config.app.environment,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let state = AppState::new(config).await?;

    // 5. Report store statistics
    let stats = state.db.get_store_stats().await?;
    copla_core::metrics::ACCOUNTS_TOTAL.set(stats.accounts);
    tracing::info!(
        accounts = stats.accounts,
        social_profiles = stats.social_profiles,
        following = stats.following,
        "Identity store ready"
    );

    Ok(())
}
