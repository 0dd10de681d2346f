//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};
use std::time::Duration;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Identity linking
    pub static ref IDENTITY_LINKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_identity_links_total", "Total number of Bluesky identity links"),
        &["sync"]
    ).expect("metric can be created");
    pub static ref IDENTITY_UNLINKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_identity_unlinks_total", "Total number of social profile unlinks"),
        &["platform"]
    ).expect("metric can be created");
    pub static ref VERIFICATION_CHANGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_artist_verification_changes_total", "Artist verified flag transitions"),
        &["state"]
    ).expect("metric can be created");

    // Session credentials
    pub static ref CREDENTIAL_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_credential_failures_total", "Session credential encrypt/decrypt failures"),
        &["operation"]
    ).expect("metric can be created");

    // Follow graph
    pub static ref FOLLOWING_SYNCS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_following_syncs_total", "Total number of following reconciliations"),
        &["mode", "status"]
    ).expect("metric can be created");
    pub static ref FOLLOWING_SYNC_ENTRIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_following_sync_entries_total", "Following entries written by full resyncs"),
        &["link"]
    ).expect("metric can be created");
    pub static ref FOLLOWING_SYNC_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "copla_following_sync_duration_seconds",
            "Following reconciliation duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0]),
        &["mode"]
    ).expect("metric can be created");

    // Store
    pub static ref ACCOUNTS_TOTAL: IntGauge = IntGauge::new(
        "copla_accounts_total",
        "Number of accounts in the identity store"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("copla_errors_total", "Total number of errors returned to callers"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(IDENTITY_LINKS_TOTAL.clone()))
        .expect("IDENTITY_LINKS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(IDENTITY_UNLINKS_TOTAL.clone()))
        .expect("IDENTITY_UNLINKS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(VERIFICATION_CHANGES_TOTAL.clone()))
        .expect("VERIFICATION_CHANGES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CREDENTIAL_FAILURES_TOTAL.clone()))
        .expect("CREDENTIAL_FAILURES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FOLLOWING_SYNCS_TOTAL.clone()))
        .expect("FOLLOWING_SYNCS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FOLLOWING_SYNC_ENTRIES_TOTAL.clone()))
        .expect("FOLLOWING_SYNC_ENTRIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FOLLOWING_SYNC_DURATION_SECONDS.clone()))
        .expect("FOLLOWING_SYNC_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(ACCOUNTS_TOTAL.clone()))
        .expect("ACCOUNTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record the outcome and duration of a following reconciliation.
pub fn observe_following_sync(mode: &str, status: &str, elapsed: Duration) {
    FOLLOWING_SYNCS_TOTAL
        .with_label_values(&[mode, status])
        .inc();
    FOLLOWING_SYNC_DURATION_SECONDS
        .with_label_values(&[mode])
        .observe(elapsed.as_secs_f64());
}

