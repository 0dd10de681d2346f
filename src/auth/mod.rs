//! Session credential protection
//!
//! Handles:
//! - Encryption of Bluesky session payloads at rest
//! - Decryption for sync jobs

mod vault;

pub use vault::CredentialVault;
