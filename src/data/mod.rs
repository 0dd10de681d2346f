//! Data layer module
//!
//! Identity store persistence:
//! - Accounts (users and artists)
//! - Social profiles with encrypted session payloads
//! - Bluesky following rows

mod database;
mod models;

pub use database::{Database, StoreStats};
pub use models::*;
