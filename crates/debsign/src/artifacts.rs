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

//! Artifact discovery from Ant-style file masks.
//!
//! A mask list is a comma-separated set of patterns relative to the job
//! workspace. Within a pattern:
//! - `*` and `?` match within a single path segment
//! - `**` matches zero or more directories
//! - a trailing `/` is shorthand for `/**`
//! - `\` is accepted as a path separator

use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while resolving artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Workspace directory {path} is not accessible: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// The files one pattern resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPattern {
    pub pattern: String,
    /// Absolute, normalized, sorted paths.
    pub matches: Vec<PathBuf>,
}

/// Result of checking one pattern against the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternCheck {
    Matches(usize),
    NoMatch,
    Invalid(String),
}

/// Expands file masks against a base directory.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    base_dir: PathBuf,
}

impl ArtifactResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Split a comma-separated mask list into trimmed, non-empty patterns.
    pub fn split_patterns(pattern_list: &str) -> Vec<&str> {
        pattern_list
            .split(',')
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
            .collect()
    }

    /// Resolve every pattern in `pattern_list`, in order.
    ///
    /// Each pattern is resolved only when the iterator reaches it, so files
    /// produced by work done on an earlier pattern are still seen.
    pub fn resolve<'a>(
        &'a self,
        pattern_list: &'a str,
    ) -> impl Iterator<Item = Result<ResolvedPattern, ArtifactError>> + 'a {
        Self::split_patterns(pattern_list)
            .into_iter()
            .map(move |pattern| {
                Ok(ResolvedPattern {
                    pattern: pattern.to_string(),
                    matches: self.resolve_pattern(pattern)?,
                })
            })
    }

    /// Resolve a single pattern to the regular files it matches.
    ///
    /// An empty result is not an error.
    pub fn resolve_pattern(&self, pattern: &str) -> Result<Vec<PathBuf>, ArtifactError> {
        let base = self.canonical_base()?;
        let full_pattern = Self::full_pattern(&base, pattern)?;

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let entries = glob::glob_with(&full_pattern, options).map_err(|e| {
            ArtifactError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::debug!(pattern = %pattern, error = %e, "Skipping unreadable path");
                    None
                }
            })
            .filter(|path| path.is_file())
            .map(|path| normalize_path(&path))
            .collect();

        matches.sort();
        matches.dedup();
        Ok(matches)
    }

    /// Check each pattern of `pattern_list` without failing on the first problem.
    pub fn check(&self, pattern_list: &str) -> Result<Vec<(String, PatternCheck)>, ArtifactError> {
        self.canonical_base()?;

        Ok(Self::split_patterns(pattern_list)
            .into_iter()
            .map(|pattern| {
                let status = match self.resolve_pattern(pattern) {
                    Ok(matches) if matches.is_empty() => PatternCheck::NoMatch,
                    Ok(matches) => PatternCheck::Matches(matches.len()),
                    Err(ArtifactError::InvalidPattern { reason, .. }) => {
                        PatternCheck::Invalid(reason)
                    }
                    Err(e) => PatternCheck::Invalid(e.to_string()),
                };
                (pattern.to_string(), status)
            })
            .collect())
    }

    fn canonical_base(&self) -> Result<PathBuf, ArtifactError> {
        std::fs::canonicalize(&self.base_dir).map_err(|source| ArtifactError::Workspace {
            path: self.base_dir.clone(),
            source,
        })
    }

    fn full_pattern(base: &Path, pattern: &str) -> Result<String, ArtifactError> {
        let mut relative = pattern.replace('\\', "/");

        if relative.starts_with('/') {
            return Err(ArtifactError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "patterns must be relative to the workspace".to_string(),
            });
        }
        if relative.ends_with('/') {
            relative.push_str("**");
        }

        // Validate the relative part on its own so errors point at the user's text
        Pattern::new(&relative).map_err(|e| ArtifactError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let base_str = base.to_string_lossy();
        Ok(format!(
            "{}/{}",
            Pattern::escape(base_str.trim_end_matches('/')),
            relative
        ))
    }
}

/// Lexically remove `.` and `..` segments from an absolute path.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
