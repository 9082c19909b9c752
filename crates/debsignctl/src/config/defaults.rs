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

use crate::config::types::*;
use std::path::PathBuf;

impl Default for DebsignConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            tools: ToolsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Per-user data directory, falling back to the system location.
fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("debsign"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/debsign"))
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            keys_file: data_dir.join("keys.toml"),
            master_key_file: data_dir.join("master.key"),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let tools = debsign::SigningTools::default();
        Self {
            gpg: tools.gpg,
            debsigs: tools.debsigs,
            expect: tools.expect,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Generate a complete default configuration as TOML string
pub fn generate_default_config_toml() -> Result<String, toml::ser::Error> {
    let config = DebsignConfig::default();
    toml::to_string_pretty(&config)
}
