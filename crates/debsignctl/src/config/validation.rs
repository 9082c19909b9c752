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

use crate::config::{types::*, ValidationError};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for DebsignConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = self.store.validate() {
            errors.push(e);
        }
        if let Err(e) = self.tools.validate() {
            errors.push(e);
        }
        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple { errors }),
        }
    }
}

fn require_file_path(field: &str, path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() || path.file_name().is_none() {
        return Err(ValidationError::InvalidPath {
            path: format!("{} must name a file, got '{}'", field, path.display()),
        });
    }
    Ok(())
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        require_file_path("store.keys_file", &self.keys_file)?;
        require_file_path("store.master_key_file", &self.master_key_file)?;

        if self.keys_file == self.master_key_file {
            return Err(ValidationError::InvalidPath {
                path: "store.keys_file and store.master_key_file must differ".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for ToolsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (tool, value) in [
            ("gpg", &self.gpg),
            ("debsigs", &self.debsigs),
            ("expect", &self.expect),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyToolName {
                    tool: tool.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ValidationError::InvalidLogLevel {
                level: self.level.clone(),
            }),
        }
    }
}
