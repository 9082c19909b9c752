/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Opaque-at-rest secret values.
//!
//! Private keys and passphrases are held as [`Secret`] values: AES-256-GCM
//! ciphertext sealed under a process-wide [`MasterKey`]. The plaintext is only
//! produced by [`Secret::reveal`] at the point where an external process needs it.
//!
//! The sealed format is: `nonce (12 bytes) || ciphertext || tag (16 bytes)`,
//! base64-encoded when serialized.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while sealing or revealing secrets.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid master key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Invalid master key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("Invalid sealed data: too short")]
    InvalidSealedData,

    #[error("Invalid sealed data encoding: {0}")]
    InvalidEncoding(String),

    #[error("Secret is not valid UTF-8")]
    InvalidUtf8,

    #[error("Failed to access master key file: {0}")]
    Io(#[from] std::io::Error),
}

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_SIZE: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
const TAG_SIZE: usize = 16;

/// Size of the master key in bytes.
const MASTER_KEY_SIZE: usize = 32;

/// The 32-byte AES-256 key every [`Secret`] is sealed under.
#[derive(Clone)]
pub struct MasterKey([u8; MASTER_KEY_SIZE]);

impl MasterKey {
    /// Generate a fresh random master key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Build a master key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecretError> {
        let key: [u8; MASTER_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| SecretError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(key))
    }

    /// Parse a hex-encoded master key.
    pub fn from_hex(encoded: &str) -> Result<Self, SecretError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| SecretError::InvalidKeyEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Load an existing master key file.
    pub fn load(path: &Path) -> Result<Self, SecretError> {
        let encoded = fs::read_to_string(path)?;
        Self::from_hex(&encoded)
    }

    /// Load the master key stored at `path`, creating it on first use.
    ///
    /// A newly created key file is written with owner-only permissions on Unix.
    pub fn load_or_create(path: &Path) -> Result<Self, SecretError> {
        if path.exists() {
            return Self::load(path);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let key = Self::generate();
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(hex::encode(key.0).as_bytes())?;
        file.sync_all()?;

        tracing::info!(path = %path.display(), "Created new master key");
        Ok(key)
    }

    fn cipher(&self) -> Result<Aes256Gcm, SecretError> {
        Aes256Gcm::new_from_slice(&self.0).map_err(|e| SecretError::EncryptionFailed(e.to_string()))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// A secret value that is only ever held sealed.
///
/// `Debug` and `Display` never render the plaintext, so a `Secret` can travel
/// inside records that end up in logs or error messages.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Secret {
    sealed: Vec<u8>,
}

impl Secret {
    /// Seal `plaintext` under `key`.
    pub fn seal(plaintext: &str, key: &MasterKey) -> Result<Self, SecretError> {
        let cipher = key.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(Self { sealed })
    }

    /// Decrypt the secret for immediate use.
    ///
    /// The returned string must not be stored beyond the invocation it is
    /// revealed for.
    pub fn reveal(&self, key: &MasterKey) -> Result<String, SecretError> {
        // An empty plaintext still carries the nonce and tag
        if self.sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(SecretError::InvalidSealedData);
        }

        let cipher = key.cipher()?;
        let nonce = Nonce::from_slice(&self.sealed[..NONCE_SIZE]);
        let plaintext = cipher
            .decrypt(nonce, &self.sealed[NONCE_SIZE..])
            .map_err(|e| SecretError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|_| SecretError::InvalidUtf8)
    }

    /// Base64 form used for persistence.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.sealed)
    }

    /// Parse the base64 persistence form.
    pub fn from_base64(encoded: &str) -> Result<Self, SecretError> {
        let sealed = BASE64
            .decode(encoded.trim())
            .map_err(|e| SecretError::InvalidEncoding(e.to_string()))?;
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(SecretError::InvalidSealedData);
        }
        Ok(Self { sealed })
    }
}

impl TryFrom<String> for Secret {
    type Error = SecretError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64(&value)
    }
}

impl From<Secret> for String {
    fn from(secret: Secret) -> Self {
        secret.to_base64()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}
