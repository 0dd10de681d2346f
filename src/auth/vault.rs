//! Session credential vault
//!
//! Opaque Bluesky session payloads are stored as
//! `base64(nonce (12 bytes) || AES-256-GCM ciphertext)`.
//! A fresh random nonce is drawn for every encryption.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use rand::RngCore;
use std::fmt;

use crate::config::{ENCRYPTION_KEY_BYTES, EncryptionConfig};
use crate::error::AppError;

const AES_GCM_NONCE_BYTES: usize = 12;

/// Symmetric vault for session payloads.
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
    max_payload_bytes: usize,
}

impl CredentialVault {
    /// Build a vault from validated encryption settings
    ///
    /// # Errors
    /// `Config` if the key is not base64 or not 32 bytes long
    pub fn new(config: &EncryptionConfig) -> Result<Self, AppError> {
        let key = config.key_bytes()?;
        Self::from_key(&key, config.max_session_bytes)
    }

    /// Build a vault from raw key bytes
    pub fn from_key(key: &[u8], max_payload_bytes: usize) -> Result<Self, AppError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            AppError::Config(format!(
                "invalid session encryption key length (expected {} bytes)",
                ENCRYPTION_KEY_BYTES
            ))
        })?;

        Ok(Self {
            cipher,
            max_payload_bytes,
        })
    }

    /// Encrypt a plaintext session payload
    ///
    /// # Errors
    /// `Encryption` for empty or oversized payloads, or a cipher failure
    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        if plaintext.is_empty() {
            return Err(AppError::Encryption(
                "session payload is empty".to_string(),
            ));
        }
        if plaintext.len() > self.max_payload_bytes {
            return Err(AppError::Encryption(format!(
                "session payload exceeds {} bytes",
                self.max_payload_bytes
            )));
        }

        let mut nonce = [0_u8; AES_GCM_NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| AppError::Encryption("session encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(AES_GCM_NONCE_BYTES + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64_STANDARD.encode(out))
    }

    /// Decrypt a stored payload produced by [`CredentialVault::encrypt`]
    ///
    /// # Errors
    /// `Decryption` if the blob is malformed, tampered with, or was written
    /// under another key
    pub fn decrypt(&self, stored: &str) -> Result<String, AppError> {
        let data = BASE64_STANDARD
            .decode(stored.trim())
            .map_err(|_| AppError::Decryption("stored session is not valid base64".to_string()))?;
        if data.len() <= AES_GCM_NONCE_BYTES {
            return Err(AppError::Decryption(
                "stored session is too short".to_string(),
            ));
        }

        let (nonce, ciphertext) = data.split_at(AES_GCM_NONCE_BYTES);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AppError::Decryption("session decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Decryption("stored session is not UTF-8".to_string()))
    }
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault")
            .field("max_payload_bytes", &self.max_payload_bytes)
            .finish_non_exhaustive()
    }
}
