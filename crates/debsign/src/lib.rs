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

//! # debsign
//!
//! Automated signing of Debian packages with GPG keys whose private key and
//! passphrase are kept as sealed secrets.
//!
//! The signing tool (`debsigs`) prompts for the key passphrase interactively.
//! Instead of passing the passphrase on a command line, each signing runs
//! under `expect` with a generated script that answers the prompt while
//! output logging is switched off.
//!
//! ## Components
//!
//! - [`key_store`]: named signing keys, persisted as TOML with sealed secrets
//! - [`artifacts`]: Ant-style file masks resolved against a workspace
//! - [`interaction`]: `expect` script generation
//! - [`launcher`]: external process execution
//! - [`orchestrator`]: the per-job signing run
//! - [`audit`]: structured progress and audit events
//!
//! ## Example
//!
//! ```rust,ignore
//! use debsign::{BuildContext, BuildStep, KeyStore, MasterKey, SignJob, SigningOrchestrator, SystemLauncher};
//! use std::sync::Arc;
//!
//! let master_key = Arc::new(MasterKey::load_or_create("/var/lib/debsign/master.key".as_ref())?);
//! let store = Arc::new(KeyStore::load("/var/lib/debsign/keys.toml")?);
//! let orchestrator = SigningOrchestrator::new(store, master_key, SystemLauncher::new());
//!
//! let job: SignJob = toml::from_str(&std::fs::read_to_string("job.toml")?)?;
//! let outcome = orchestrator.run(&job, &BuildContext::new("/build/workspace")).await?;
//! ```

pub mod artifacts;
pub mod audit;
pub mod interaction;
pub mod key_store;
pub mod launcher;
pub mod orchestrator;
pub mod secret;

pub use artifacts::{ArtifactError, ArtifactResolver, PatternCheck, ResolvedPattern};
pub use interaction::{is_script_safe, CommandLine, InteractionScriptBuilder, PASSPHRASE_PROMPT};
pub use key_store::{KeyStore, KeyStoreError, SigningKeyRecord};
pub use launcher::{LaunchError, ProcessLauncher, ProcessSpec, SystemLauncher};
pub use orchestrator::{
    BuildContext, BuildResult, BuildStep, SignError, SignJob, SignTask, SigningOrchestrator,
    SigningTools, StepOutcome,
};
pub use secret::{MasterKey, Secret, SecretError};
