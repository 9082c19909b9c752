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

//! Locating and reading `debsign.toml`.
//!
//! A file named on the command line wins, then `$DEBSIGN_CONFIG`, then the
//! first existing search path. Values may reference the environment as
//! `${VAR}`, `${VAR:-fallback}` or `${VAR:?message}`.

use crate::config::{ConfigError, DebsignConfig};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "DEBSIGN_CONFIG";

const PLACEHOLDER: &str = r"\$\{([^}]+)\}";

pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Search `./debsign.toml`, the user config dir, then `/etc/debsign`.
    pub fn new() -> Self {
        let user = dirs::config_dir().map(|dir| dir.join("debsign").join("config.toml"));
        let search_paths = std::iter::once(PathBuf::from("./debsign.toml"))
            .chain(user)
            .chain(std::iter::once(PathBuf::from("/etc/debsign/config.toml")))
            .collect();
        Self { search_paths }
    }

    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// The file that [`load_config`](Self::load_config) would read, if any.
    pub fn resolve_config_path(&self, config_file: Option<&Path>) -> Option<PathBuf> {
        config_file
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .or_else(|| self.find_config_file())
    }

    /// Built-in defaults are used when no file is named and none is found.
    pub fn load_config(&self, config_file: Option<&Path>) -> Result<DebsignConfig, ConfigError> {
        let Some(path) = self.resolve_config_path(config_file) else {
            tracing::debug!(searched = ?self.search_paths, "No configuration file, using defaults");
            return Ok(DebsignConfig::default());
        };
        self.load_config_from_file(&path)
    }

    pub fn load_config_from_file(&self, path: &Path) -> Result<DebsignConfig, ConfigError> {
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            if ext != "toml" {
                return Err(ConfigError::UnsupportedFormat {
                    extension: ext.to_string(),
                });
            }
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&substitute_env_vars(&raw)?)?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|path| path.is_file()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace every placeholder in one left-to-right pass. Substituted text is
/// not scanned again.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
    let placeholder =
        Regex::new(PLACEHOLDER).map_err(|e| ConfigError::EnvSubstitutionError(e.to_string()))?;

    let mut out = String::with_capacity(content.len());
    let mut copied_to = 0;
    for caps in placeholder.captures_iter(content) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&content[copied_to..whole.start()]);
        out.push_str(&expand(expr.as_str())?);
        copied_to = whole.end();
    }
    out.push_str(&content[copied_to..]);
    Ok(out)
}

fn expand(expr: &str) -> Result<String, ConfigError> {
    if let Some((name, fallback)) = expr.split_once(":-") {
        return Ok(env::var(name).unwrap_or_else(|_| fallback.to_string()));
    }

    let (name, hint) = match expr.split_once(":?") {
        Some((name, hint)) => (name, Some(hint)),
        None => (expr, None),
    };
    env::var(name).map_err(|_| {
        let mut message = format!("Required environment variable '{}' is not set", name);
        if let Some(hint) = hint {
            message.push_str(": ");
            message.push_str(hint);
        }
        ConfigError::EnvSubstitutionError(message)
    })
}
