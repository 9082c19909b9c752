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

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebsignConfig {
    pub store: StoreConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}

/// Where signing keys and the master key that seals them are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub keys_file: PathBuf,
    pub master_key_file: PathBuf,
}

/// Executables driven during a signing run. Bare names are looked up on `PATH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub gpg: String,
    pub debsigs: String,
    pub expect: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl From<&ToolsConfig> for debsign::SigningTools {
    fn from(tools: &ToolsConfig) -> Self {
        Self {
            gpg: tools.gpg.clone(),
            debsigs: tools.debsigs.clone(),
            expect: tools.expect.clone(),
        }
    }
}
