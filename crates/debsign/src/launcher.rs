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

//! External process execution.
//!
//! The orchestrator never spawns processes directly; it hands a
//! [`ProcessSpec`] to a [`ProcessLauncher`]. [`SystemLauncher`] is the
//! production implementation and tests substitute their own.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Errors that can occur while running an external process.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to feed stdin of '{program}': {source}")]
    Stdin {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("Interrupted while waiting for '{program}'")]
    Interrupted { program: String },
}

/// Everything needed to run one external process.
///
/// `stdin` may carry secret material, so it is consumed by the launch and
/// never rendered by `Debug`.
#[derive(Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub current_dir: PathBuf,
    pub envs: HashMap<String, String>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            current_dir: current_dir.into(),
            envs: HashMap::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, bytes: Vec<u8>) -> Self {
        self.stdin = Some(bytes);
        self
    }

    pub fn envs(mut self, envs: &HashMap<String, String>) -> Self {
        self.envs
            .extend(envs.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

impl fmt::Debug for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field(
                "stdin",
                &self.stdin.as_ref().map(|bytes| format!("<{} bytes>", bytes.len())),
            )
            .field("current_dir", &self.current_dir)
            .field("envs", &self.envs.len())
            .finish()
    }
}

/// Runs external processes to completion.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run `spec` and return its exit code.
    ///
    /// Implementations must not return before the process has exited, and must
    /// terminate it and return [`LaunchError::Interrupted`] if the host is
    /// interrupted while waiting.
    async fn launch(&self, spec: ProcessSpec) -> Result<i32, LaunchError>;
}

/// Launcher backed by `tokio::process`.
///
/// The child inherits stdout and stderr. Ctrl-C while waiting kills the child.
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn launch(&self, spec: ProcessSpec) -> Result<i32, LaunchError> {
        let ProcessSpec {
            program,
            args,
            stdin,
            current_dir,
            envs,
        } = spec;

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .current_dir(&current_dir)
            .envs(&envs)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        tracing::debug!(program = %program, args = ?args, cwd = %current_dir.display(), "Launching process");

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;

        if let Some(bytes) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(&bytes)
                    .await
                    .map_err(|source| LaunchError::Stdin {
                        program: program.clone(),
                        source,
                    })?;
                // Dropping the pipe closes it so the child sees EOF
                drop(pipe);
            }
            drop(bytes);
        }

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| LaunchError::Wait {
                    program: program.clone(),
                    source,
                })?;
                let code = exit_code(&status);
                tracing::debug!(program = %program, code = code, "Process exited");
                Ok(code)
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(program = %program, "Interrupted, terminating child process");
                let _ = child.kill().await;
                Err(LaunchError::Interrupted { program })
            }
        }
    }
}

/// Exit code, or `128 + signal` for a child killed by a signal.
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
