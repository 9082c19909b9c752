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

//! Signing run coordination.
//!
//! For every [`SignTask`] of a [`SignJob`] the [`SigningOrchestrator`] walks:
//!
//! ```text
//! Idle → KeyLookup → (KeyImport) → KeyVerify → ArtifactLoop → Done
//!                                      │             │
//!                                      └─────────────┴──► Failed
//! ```
//!
//! Execution is strictly sequential and stops at the first fatal failure.
//! Secrets are revealed right before the process that needs them and dropped
//! right after.

use crate::artifacts::{ArtifactError, ArtifactResolver, ResolvedPattern};
use crate::audit;
use crate::interaction::{CommandLine, InteractionScriptBuilder};
use crate::key_store::{KeyStore, SigningKeyRecord};
use crate::launcher::{LaunchError, ProcessLauncher, ProcessSpec};
use crate::secret::{MasterKey, SecretError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that end a signing run.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("Can't find GPG key: {key_name}")]
    KeyUnavailable { key_name: String },

    #[error("Signing {} failed with exit code {}", .artifact.display(), .exit_code)]
    SigningFailed {
        artifact: PathBuf,
        exit_code: i32,
        /// Artifacts signed before the failure.
        signed: Vec<PathBuf>,
    },

    #[error("Signing run interrupted")]
    Interrupted,

    #[error("Process error: {0}")]
    Launch(LaunchError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl From<LaunchError> for SignError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Interrupted { .. } => SignError::Interrupted,
            other => SignError::Launch(other),
        }
    }
}

/// Overall result of a build, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    pub fn is_better_or_equal_to(self, other: BuildResult) -> bool {
        self <= other
    }

    pub fn is_worse_than(self, other: BuildResult) -> bool {
        self > other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildResult::Success => "success",
            BuildResult::Unstable => "unstable",
            BuildResult::Failure => "failure",
            BuildResult::NotBuilt => "not_built",
            BuildResult::Aborted => "aborted",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "success" => Ok(BuildResult::Success),
            "unstable" => Ok(BuildResult::Unstable),
            "failure" => Ok(BuildResult::Failure),
            "not_built" => Ok(BuildResult::NotBuilt),
            "aborted" => Ok(BuildResult::Aborted),
            other => Err(format!(
                "unknown build result '{}' (expected success, unstable, failure, not_built or aborted)",
                other
            )),
        }
    }
}

/// One signing entry of a job: which key, which files, which extra options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignTask {
    pub key_name: String,
    /// Comma-separated file masks relative to the workspace.
    pub includes: String,
    /// Extra signing-tool options, split on whitespace.
    #[serde(default)]
    pub cmdline_opts: String,
}

/// The signing entries configured for a job, processed in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignJob {
    #[serde(default)]
    pub entries: Vec<SignTask>,
}

/// What the host knows about the build when the step runs.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub workspace: PathBuf,
    pub env: HashMap<String, String>,
    /// `None` while the build has not produced a result yet.
    pub result: Option<BuildResult>,
}

impl BuildContext {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            env: HashMap::new(),
            result: None,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_result(mut self, result: BuildResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Signing proceeds for builds that are successful, unstable, or unfinished.
    pub fn should_sign(&self) -> bool {
        match self.result {
            None => true,
            Some(result) => result.is_better_or_equal_to(BuildResult::Unstable),
        }
    }
}

/// How a step that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The build was already broken; nothing ran.
    Skipped,
    Completed { signed: Vec<PathBuf> },
}

/// Host-facing entry point of a build step.
#[async_trait]
pub trait BuildStep: Send + Sync {
    async fn run(&self, job: &SignJob, ctx: &BuildContext) -> Result<StepOutcome, SignError>;
}

/// Names of the external tools the orchestrator drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningTools {
    pub gpg: String,
    pub debsigs: String,
    pub expect: String,
}

impl Default for SigningTools {
    fn default() -> Self {
        Self {
            gpg: "gpg".to_string(),
            debsigs: "debsigs".to_string(),
            expect: "expect".to_string(),
        }
    }
}

/// One signing invocation. Lives only as long as the process it describes.
struct SigningAttempt {
    artifact: PathBuf,
    command: CommandLine,
    script: Vec<u8>,
}

impl fmt::Debug for SigningAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningAttempt")
            .field("artifact", &self.artifact)
            .field("command", &self.command)
            .field("script", &format_args!("<{} bytes>", self.script.len()))
            .finish()
    }
}

/// Coordinates key import, key verification and per-artifact signing.
pub struct SigningOrchestrator<L: ProcessLauncher> {
    store: Arc<KeyStore>,
    master_key: Arc<MasterKey>,
    launcher: L,
    tools: SigningTools,
    scripts: InteractionScriptBuilder,
}

impl<L: ProcessLauncher> SigningOrchestrator<L> {
    pub fn new(store: Arc<KeyStore>, master_key: Arc<MasterKey>, launcher: L) -> Self {
        Self {
            store,
            master_key,
            launcher,
            tools: SigningTools::default(),
            scripts: InteractionScriptBuilder::new(),
        }
    }

    pub fn with_tools(mut self, tools: SigningTools) -> Self {
        self.tools = tools;
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    async fn run_task(
        &self,
        task: &SignTask,
        ctx: &BuildContext,
        signed: &mut Vec<PathBuf>,
    ) -> Result<(), SignError> {
        let key_name = task.key_name.as_str();
        let record = self.store.lookup(key_name);

        if let Some(record) = &record {
            self.import_key(record, ctx).await?;
        }

        // A key with no record is never usable, whatever the keyring holds
        let verified = match &record {
            Some(_) => self.verify_key(key_name, ctx).await?,
            None => false,
        };
        let record = match record {
            Some(record) if verified => record,
            _ => {
                audit::log_key_verify_failed(key_name);
                return Err(SignError::KeyUnavailable {
                    key_name: key_name.to_string(),
                });
            }
        };

        let resolver = ArtifactResolver::new(&ctx.workspace);
        for resolved in resolver.resolve(&task.includes) {
            let ResolvedPattern { pattern, matches } = resolved?;
            audit::log_pattern_started(&pattern);

            if matches.is_empty() {
                audit::log_pattern_no_match(&pattern);
                continue;
            }

            for artifact in matches {
                let exit_code = self
                    .sign_artifact(&record, task, &artifact, ctx)
                    .await?;
                if exit_code != 0 {
                    audit::log_artifact_sign_failed(&artifact, exit_code);
                    return Err(SignError::SigningFailed {
                        artifact,
                        exit_code,
                        signed: std::mem::take(signed),
                    });
                }
                audit::log_artifact_signed(&artifact, key_name);
                signed.push(artifact);
            }
        }

        Ok(())
    }

    /// Feed the private key to the keyring. Only interruption is fatal here.
    async fn import_key(
        &self,
        record: &SigningKeyRecord,
        ctx: &BuildContext,
    ) -> Result<(), SignError> {
        let private_key = record.private_key.reveal(&self.master_key)?;
        if private_key.is_empty() {
            return Ok(());
        }

        audit::log_key_import_started(&record.name);
        let spec = ProcessSpec::new(&self.tools.gpg, &ctx.workspace)
            .args(["--import", "-"])
            .envs(&ctx.env)
            .stdin(private_key.into_bytes());

        match self.launcher.launch(spec).await {
            Ok(0) => audit::log_key_import_completed(&record.name),
            Ok(code) => {
                audit::log_key_import_failed(&record.name, &format!("exit code {}", code))
            }
            Err(LaunchError::Interrupted { .. }) => return Err(SignError::Interrupted),
            Err(e) => audit::log_key_import_failed(&record.name, &e.to_string()),
        }
        Ok(())
    }

    /// Ask the keyring whether `key_name` is usable.
    ///
    /// A keyring query that cannot run counts as an unusable key.
    async fn verify_key(&self, key_name: &str, ctx: &BuildContext) -> Result<bool, SignError> {
        let spec = ProcessSpec::new(&self.tools.gpg, &ctx.workspace)
            .args(["--fingerprint", key_name])
            .envs(&ctx.env);
        match self.launcher.launch(spec).await {
            Ok(code) => Ok(code == 0),
            Err(LaunchError::Interrupted { .. }) => Err(SignError::Interrupted),
            Err(e) => {
                tracing::error!(key_name = %key_name, error = %e, "Key verification could not run");
                Ok(false)
            }
        }
    }

    async fn sign_artifact(
        &self,
        record: &SigningKeyRecord,
        task: &SignTask,
        artifact: &Path,
        ctx: &BuildContext,
    ) -> Result<i32, SignError> {
        let command = CommandLine::new(&self.tools.debsigs)
            .arg("--sign=origin")
            .arg("-k")
            .arg(&task.key_name)
            .tokenized(&task.cmdline_opts)
            .arg(artifact.to_string_lossy());

        let passphrase = record.passphrase.reveal(&self.master_key)?;
        let attempt = SigningAttempt {
            artifact: artifact.to_path_buf(),
            script: self.scripts.build(&command, &passphrase),
            command,
        };
        drop(passphrase);

        audit::log_sign_started(&attempt.artifact, &attempt.command.to_string());
        tracing::debug!(attempt = ?attempt, "Prepared signing attempt");

        let spec = ProcessSpec::new(&self.tools.expect, &ctx.workspace)
            .args(["-"])
            .envs(&ctx.env)
            .stdin(attempt.script);
        Ok(self.launcher.launch(spec).await?)
    }
}

#[async_trait]
impl<L: ProcessLauncher> BuildStep for SigningOrchestrator<L> {
    async fn run(&self, job: &SignJob, ctx: &BuildContext) -> Result<StepOutcome, SignError> {
        if !ctx.should_sign() {
            let result = ctx.result.map(BuildResult::as_str).unwrap_or("unknown");
            audit::log_signing_skipped(result);
            return Ok(StepOutcome::Skipped);
        }

        audit::log_signing_started(job.entries.len());

        let mut signed = Vec::new();
        for task in &job.entries {
            self.run_task(task, ctx, &mut signed).await?;
        }

        audit::log_signing_finished(signed.len());
        Ok(StepOutcome::Completed { signed })
    }
}
