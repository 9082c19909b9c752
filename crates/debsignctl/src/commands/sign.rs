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

use crate::cli::{Cli, SignArgs};
use crate::commands::{load_master_key, open_store};
use crate::config::DebsignConfig;
use crate::utils::{should_print, LogLevel};
use anyhow::{Context, Result};
use colored::Colorize;
use debsign::{
    BuildContext, BuildResult, BuildStep, SignError, SignJob, SignTask, SigningOrchestrator, StepOutcome,
    SystemLauncher,
};
use std::fs;
use std::sync::Arc;

/// How a `sign` invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignStatus {
    Completed { signed: usize },
    Skipped,
    Failed,
    Interrupted,
}

impl SignStatus {
    /// Process exit code: 0 for success or skip, 1 for failure, 130 for Ctrl-C.
    pub fn exit_code(self) -> u8 {
        match self {
            SignStatus::Completed { .. } | SignStatus::Skipped => 0,
            SignStatus::Failed => 1,
            SignStatus::Interrupted => 130,
        }
    }
}

/// The job described by `args`: a job file, or a single entry from flags.
pub fn build_job(args: &SignArgs) -> Result<SignJob> {
    if let Some(path) = &args.job {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        return toml::from_str(&content)
            .with_context(|| format!("Failed to parse job file {}", path.display()));
    }

    match (&args.key, &args.include) {
        (Some(key_name), Some(includes)) => Ok(SignJob {
            entries: vec![SignTask {
                key_name: key_name.clone(),
                includes: includes.clone(),
                cmdline_opts: args.extra_args.clone().unwrap_or_default(),
            }],
        }),
        _ => anyhow::bail!("Either --job or both --key and --include are required"),
    }
}

fn report_skipped(result: BuildResult, cli: &Cli) -> SignStatus {
    if should_print(cli, LogLevel::Info) {
        println!(
            "{} Build result is {}, signing skipped",
            "→".yellow(),
            result
        );
    }
    SignStatus::Skipped
}

pub async fn run_sign(args: &SignArgs, config: &DebsignConfig, cli: &Cli) -> Result<SignStatus> {
    // Nothing is opened for a build worse than Unstable
    if let Some(result) = args
        .build_result
        .filter(|result| result.is_worse_than(BuildResult::Unstable))
    {
        debsign::audit::log_signing_skipped(&result.to_string());
        return Ok(report_skipped(result, cli));
    }

    let job = build_job(args)?;
    if job.entries.is_empty() {
        tracing::warn!("Job has no signing entries");
    }

    let workspace = fs::canonicalize(&args.workspace)
        .with_context(|| format!("Workspace {} is not accessible", args.workspace.display()))?;

    let store = Arc::new(open_store(config)?);
    let master_key = Arc::new(load_master_key(config)?);
    let orchestrator = SigningOrchestrator::new(store, master_key, SystemLauncher::new())
        .with_tools((&config.tools).into());

    // Child processes inherit this process's environment
    let mut ctx = BuildContext::new(workspace);
    ctx.result = args.build_result;

    let status = match orchestrator.run(&job, &ctx).await {
        Ok(StepOutcome::Skipped) => {
            report_skipped(ctx.result.unwrap_or(BuildResult::Failure), cli)
        }
        Ok(StepOutcome::Completed { signed }) => {
            if should_print(cli, LogLevel::Info) {
                println!(
                    "{} Signed {} package{}",
                    "✓".green().bold(),
                    signed.len(),
                    if signed.len() == 1 { "" } else { "s" }
                );
            }
            if should_print(cli, LogLevel::Debug) {
                for path in &signed {
                    println!("    {}", path.display());
                }
            }
            SignStatus::Completed {
                signed: signed.len(),
            }
        }
        Err(SignError::Interrupted) => {
            eprintln!("{} Signing interrupted", "✗".red().bold());
            SignStatus::Interrupted
        }
        Err(SignError::SigningFailed {
            artifact,
            exit_code,
            signed,
        }) => {
            eprintln!(
                "{} Signing {} failed with exit code {}",
                "✗".red().bold(),
                artifact.display().to_string().cyan(),
                exit_code
            );
            if !signed.is_empty() {
                eprintln!("  Signed before the failure:");
                for path in &signed {
                    eprintln!("    {}", path.display());
                }
            }
            SignStatus::Failed
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e.to_string().red());
            SignStatus::Failed
        }
    };

    Ok(status)
}
