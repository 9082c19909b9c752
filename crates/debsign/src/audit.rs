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

//! Structured audit logging for signing runs.
//!
//! Every progress notice a signing run emits goes through this module so the
//! event types stay stable for log aggregation:
//! - Run lifecycle (start, finish, skip)
//! - Key operations (import, verify)
//! - Artifact resolution and signing
//! - Key store persistence
//!
//! None of these functions accept secret material.

use std::path::Path;

/// Event types for signing runs.
pub mod events {
    /// Signing run started.
    pub const SIGNING_STARTED: &str = "signing.started";
    /// Signing run finished with every artifact signed.
    pub const SIGNING_FINISHED: &str = "signing.finished";
    /// Signing run skipped because the build is already broken.
    pub const SIGNING_SKIPPED: &str = "signing.skipped";

    /// Private key import started.
    pub const KEY_IMPORT_STARTED: &str = "key.import.started";
    /// Private key import finished.
    pub const KEY_IMPORT_COMPLETED: &str = "key.import.completed";
    /// Private key import failed (non-fatal).
    pub const KEY_IMPORT_FAILED: &str = "key.import.failed";
    /// Key could not be found in the keyring.
    pub const KEY_VERIFY_FAILED: &str = "key.verify.failed";

    /// Pattern resolution started.
    pub const ARTIFACT_PATTERN_STARTED: &str = "artifact.pattern.started";
    /// Pattern matched no files.
    pub const ARTIFACT_PATTERN_NO_MATCH: &str = "artifact.pattern.no_match";
    /// Signing command about to run.
    pub const ARTIFACT_SIGN_STARTED: &str = "artifact.sign.started";
    /// Artifact signed.
    pub const ARTIFACT_SIGNED: &str = "artifact.signed";
    /// Artifact signing failed.
    pub const ARTIFACT_SIGN_FAILED: &str = "artifact.sign.failed";

    /// Key store loaded from disk.
    pub const KEYSTORE_LOADED: &str = "keystore.loaded";
    /// Key store flushed to disk.
    pub const KEYSTORE_SAVED: &str = "keystore.saved";
}

/// Log the start of a signing run.
pub fn log_signing_started(entries: usize) {
    tracing::info!(
        event_type = events::SIGNING_STARTED,
        entries = entries,
        "[DebSign] - Starting signing DEBs ..."
    );
}

/// Log the successful end of a signing run.
pub fn log_signing_finished(signed: usize) {
    tracing::info!(
        event_type = events::SIGNING_FINISHED,
        signed = signed,
        "[DebSign] - Finished signing DEBs ..."
    );
}

/// Log a skipped signing run.
pub fn log_signing_skipped(build_result: &str) {
    tracing::info!(
        event_type = events::SIGNING_SKIPPED,
        build_result = %build_result,
        "[DebSign] - Skipping signing DEBs ..."
    );
}

/// Log the start of a private key import.
pub fn log_key_import_started(key_name: &str) {
    tracing::info!(
        event_type = events::KEY_IMPORT_STARTED,
        key_name = %key_name,
        "[DebSign] - Importing private key"
    );
}

/// Log the end of a private key import.
pub fn log_key_import_completed(key_name: &str) {
    tracing::info!(
        event_type = events::KEY_IMPORT_COMPLETED,
        key_name = %key_name,
        "[DebSign] - Imported private key"
    );
}

/// Log a failed private key import.
///
/// Import failures are warnings: the key may already be in the keyring, and
/// the verification step decides whether the run can continue.
pub fn log_key_import_failed(key_name: &str, reason: &str) {
    tracing::warn!(
        event_type = events::KEY_IMPORT_FAILED,
        key_name = %key_name,
        reason = %reason,
        "[DebSign] - Private key import did not succeed"
    );
}

/// Log a key that could not be found in the keyring.
pub fn log_key_verify_failed(key_name: &str) {
    tracing::error!(
        event_type = events::KEY_VERIFY_FAILED,
        key_name = %key_name,
        "[DebSign] - Can't find GPG key: {}",
        key_name
    );
}

/// Log the start of pattern resolution.
pub fn log_pattern_started(pattern: &str) {
    tracing::info!(
        event_type = events::ARTIFACT_PATTERN_STARTED,
        pattern = %pattern,
        "[DebSign] - Publishing {}",
        pattern
    );
}

/// Log a pattern that matched nothing.
pub fn log_pattern_no_match(pattern: &str) {
    tracing::info!(
        event_type = events::ARTIFACT_PATTERN_NO_MATCH,
        pattern = %pattern,
        "[DebSign] - No DEBs matching {}",
        pattern
    );
}

/// Log the signing command about to run.
///
/// `command_line` must be the signing tool's own command line, which never
/// carries the passphrase.
pub fn log_sign_started(artifact: &Path, command_line: &str) {
    tracing::info!(
        event_type = events::ARTIFACT_SIGN_STARTED,
        artifact = %artifact.display(),
        "[DebSign] - Running {}",
        command_line
    );
}

/// Log a signed artifact.
pub fn log_artifact_signed(artifact: &Path, key_name: &str) {
    tracing::info!(
        event_type = events::ARTIFACT_SIGNED,
        artifact = %artifact.display(),
        key_name = %key_name,
        "[DebSign] - Signed {}",
        artifact.display()
    );
}

/// Log a failed signing invocation.
pub fn log_artifact_sign_failed(artifact: &Path, exit_code: i32) {
    tracing::error!(
        event_type = events::ARTIFACT_SIGN_FAILED,
        artifact = %artifact.display(),
        exit_code = exit_code,
        "[DebSign] - Failed signing DEBs ..."
    );
}

/// Log a key store load.
pub fn log_keystore_loaded(path: &Path, records: usize) {
    tracing::debug!(
        event_type = events::KEYSTORE_LOADED,
        path = %path.display(),
        records = records,
        "Key store loaded"
    );
}

/// Log a key store flush.
pub fn log_keystore_saved(path: &Path, records: usize) {
    tracing::info!(
        event_type = events::KEYSTORE_SAVED,
        path = %path.display(),
        records = records,
        "Key store saved"
    );
}
