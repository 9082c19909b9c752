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

//! Registry of named signing keys.
//!
//! The [`KeyStore`] owns the administrator-configured [`SigningKeyRecord`]s.
//! It is loaded once at process start and only mutated through
//! [`KeyStore::replace`], which flushes the full record set to disk before
//! the new set becomes visible to readers.

use crate::audit;
use crate::secret::{MasterKey, Secret, SecretError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during key store operations.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("Failed to read key store {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write key store {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse key store {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize key store: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid key record: {0}")]
    InvalidRecord(String),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),
}

/// A named signing key and its secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeyRecord {
    /// Identifier used for lookup and passed to the signing tool as the key id.
    pub name: String,
    /// ASCII-armored private key block.
    pub private_key: Secret,
    pub passphrase: Secret,
}

impl SigningKeyRecord {
    /// Seal plaintext key material into a new record.
    pub fn seal(
        name: impl Into<String>,
        private_key: &str,
        passphrase: &str,
        master_key: &MasterKey,
    ) -> Result<Self, KeyStoreError> {
        Ok(Self {
            name: name.into(),
            private_key: Secret::seal(private_key, master_key)?,
            passphrase: Secret::seal(passphrase, master_key)?,
        })
    }

    /// Check that every field is filled in.
    pub fn validate(&self, master_key: &MasterKey) -> Result<(), KeyStoreError> {
        if self.name.trim().is_empty() {
            return Err(KeyStoreError::InvalidRecord("name is required".to_string()));
        }
        if self.private_key.reveal(master_key)?.trim().is_empty() {
            return Err(KeyStoreError::InvalidRecord(format!(
                "private key is required for '{}'",
                self.name
            )));
        }
        if self.passphrase.reveal(master_key)?.is_empty() {
            return Err(KeyStoreError::InvalidRecord(format!(
                "passphrase is required for '{}'",
                self.name
            )));
        }
        Ok(())
    }
}

/// On-disk layout: one `[[key]]` table per record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct KeyStoreFile {
    #[serde(default, rename = "key")]
    keys: Vec<SigningKeyRecord>,
}

/// Durable, named collection of signing keys.
///
/// Readers take a snapshot under a read lock, so concurrent runs may share
/// one store through an `Arc<KeyStore>`.
#[derive(Debug)]
pub struct KeyStore {
    path: PathBuf,
    records: RwLock<Arc<Vec<SigningKeyRecord>>>,
}

impl KeyStore {
    /// Load the last flushed record set from `path`, or start empty if the
    /// file does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, KeyStoreError> {
        let path = path.into();
        let records = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| KeyStoreError::Read {
                path: path.clone(),
                source,
            })?;
            let file: KeyStoreFile =
                toml::from_str(&content).map_err(|source| KeyStoreError::Parse {
                    path: path.clone(),
                    source,
                })?;
            file.keys
        } else {
            Vec::new()
        };

        audit::log_keystore_loaded(&path, records.len());

        Ok(Self {
            path,
            records: RwLock::new(Arc::new(records)),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the first record whose name equals `name` exactly.
    pub fn lookup(&self, name: &str) -> Option<SigningKeyRecord> {
        if name.trim().is_empty() {
            return None;
        }
        self.records
            .read()
            .iter()
            .find(|record| record.name == name)
            .cloned()
    }

    /// All records in configuration order.
    pub fn list(&self) -> Arc<Vec<SigningKeyRecord>> {
        Arc::clone(&self.records.read())
    }

    /// Record names in configuration order, for selection lists.
    pub fn names(&self) -> Vec<String> {
        self.records
            .read()
            .iter()
            .map(|record| record.name.clone())
            .collect()
    }

    /// Replace the full record set.
    ///
    /// The new set is written to a temporary file next to the store, synced,
    /// and renamed over the old file before it becomes visible.
    pub fn replace(&self, records: Vec<SigningKeyRecord>) -> Result<(), KeyStoreError> {
        let file = KeyStoreFile { keys: records };
        let content = toml::to_string_pretty(&file)?;

        let write_err = |source| KeyStoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path)
            .map_err(|e| write_err(e.error))?;

        audit::log_keystore_saved(&self.path, file.keys.len());
        *self.records.write() = Arc::new(file.keys);
        Ok(())
    }

    /// Insert `record`, replacing any record with the same name in place.
    pub fn upsert(&self, record: SigningKeyRecord) -> Result<(), KeyStoreError> {
        let mut records: Vec<SigningKeyRecord> = self.list().as_ref().clone();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.replace(records)
    }

    /// Remove every record named `name`. Returns whether anything was removed.
    pub fn remove(&self, name: &str) -> Result<bool, KeyStoreError> {
        let current = self.list();
        let records: Vec<SigningKeyRecord> = current
            .iter()
            .filter(|record| record.name != name)
            .cloned()
            .collect();
        if records.len() == current.len() {
            return Ok(false);
        }
        self.replace(records)?;
        Ok(true)
    }
}
