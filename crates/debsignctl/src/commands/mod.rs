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

pub mod check;
pub mod config;
pub mod key;
pub mod sign;

use crate::config::DebsignConfig;
use anyhow::{Context, Result};
use debsign::{KeyStore, MasterKey};

/// Open the configured key store.
pub fn open_store(config: &DebsignConfig) -> Result<KeyStore> {
    KeyStore::load(&config.store.keys_file).with_context(|| {
        format!(
            "Failed to load key store {}",
            config.store.keys_file.display()
        )
    })
}

/// Load the master key, creating it if this is the first key being stored.
pub fn load_or_create_master_key(config: &DebsignConfig) -> Result<MasterKey> {
    MasterKey::load_or_create(&config.store.master_key_file).with_context(|| {
        format!(
            "Failed to load master key {}",
            config.store.master_key_file.display()
        )
    })
}

/// Load an existing master key.
pub fn load_master_key(config: &DebsignConfig) -> Result<MasterKey> {
    let path = &config.store.master_key_file;
    if !path.exists() {
        anyhow::bail!(
            "Master key {} does not exist. Store a key with 'debsignctl key add' first.",
            path.display()
        );
    }
    MasterKey::load(path).with_context(|| format!("Failed to load master key {}", path.display()))
}
