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

use clap::{ArgGroup, Args, Parser, Subcommand};
use debsign::BuildResult;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "debsignctl",
    version,
    about = "Sign Debian packages with stored GPG keys",
    long_about = "Manage named GPG signing keys and sign .deb artifacts with debsigs, answering the passphrase prompt through expect"
)]
pub struct Cli {
    /// Configuration file (overrides DEBSIGN_CONFIG and the search path)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Control colored output [auto, always, never]
    #[arg(long, global = true, default_value = "auto")]
    pub color: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Signing key management
    #[command(subcommand)]
    Key(KeyCommands),

    /// Sign Debian packages in a workspace
    Sign(SignArgs),

    /// Report what each file mask matches without signing anything
    Check(CheckArgs),

    /// Configuration file operations
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Store a signing key, replacing any key with the same name
    Add(KeyAddArgs),
    /// List stored signing key names
    List,
    /// Remove a stored signing key
    Remove {
        /// Name of the key to remove
        #[arg(long)]
        name: String,
    },
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("passphrase")
        .required(true)
        .args(["passphrase_env", "passphrase_file"])
))]
pub struct KeyAddArgs {
    /// Key name, passed to debsigs as the key id
    #[arg(long)]
    pub name: String,

    /// File holding the ASCII-armored private key block
    #[arg(long)]
    pub private_key_file: PathBuf,

    /// Environment variable holding the key passphrase
    #[arg(long, value_name = "VAR")]
    pub passphrase_env: Option<String>,

    /// File whose first line is the key passphrase
    #[arg(long)]
    pub passphrase_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["job", "key"])
))]
pub struct SignArgs {
    /// TOML job file with one [[entries]] table per signing entry
    #[arg(long, conflicts_with_all = ["key", "include", "extra_args"])]
    pub job: Option<PathBuf>,

    /// Name of the stored key to sign with
    #[arg(long, requires = "include")]
    pub key: Option<String>,

    /// Comma-separated file masks relative to the workspace (e.g. "dist/**/*.deb")
    #[arg(long, requires = "key")]
    pub include: Option<String>,

    /// Extra debsigs options, split on whitespace
    #[arg(long = "args", value_name = "OPTIONS", allow_hyphen_values = true)]
    pub extra_args: Option<String>,

    /// Workspace directory the masks are resolved against
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Result of the build so far; signing is skipped when worse than unstable
    #[arg(long, value_name = "RESULT")]
    pub build_result: Option<BuildResult>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Comma-separated file masks relative to the workspace
    #[arg(long)]
    pub include: String,

    /// Workspace directory the masks are resolved against
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration to a file
    Init {
        /// Output file
        #[arg(short, long, default_value = "debsign.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
}
