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

use crate::cli::{Cli, KeyAddArgs, KeyCommands};
use crate::commands::{load_or_create_master_key, open_store};
use crate::config::DebsignConfig;
use crate::utils::{should_print, LogLevel};
use anyhow::{Context, Result};
use colored::Colorize;
use debsign::{is_script_safe, SigningKeyRecord};
use std::fs;

pub fn handle_key_command(command: &KeyCommands, config: &DebsignConfig, cli: &Cli) -> Result<()> {
    match command {
        KeyCommands::Add(args) => add_key(args, config, cli),
        KeyCommands::List => list_keys(config, cli),
        KeyCommands::Remove { name } => remove_key(name, config, cli),
    }
}

/// Read the passphrase from the environment variable or file named in `args`.
pub fn read_passphrase(args: &KeyAddArgs) -> Result<String> {
    if let Some(var) = &args.passphrase_env {
        return std::env::var(var)
            .with_context(|| format!("Environment variable '{}' is not set", var));
    }
    if let Some(path) = &args.passphrase_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read passphrase file {}", path.display()))?;
        return Ok(content.lines().next().unwrap_or_default().to_string());
    }
    anyhow::bail!("Either --passphrase-env or --passphrase-file is required")
}

fn add_key(args: &KeyAddArgs, config: &DebsignConfig, cli: &Cli) -> Result<()> {
    let private_key = fs::read_to_string(&args.private_key_file).with_context(|| {
        format!(
            "Failed to read private key file {}",
            args.private_key_file.display()
        )
    })?;
    let passphrase = read_passphrase(args)?;

    if !is_script_safe(&passphrase) {
        tracing::warn!(key_name = %args.name, "Passphrase contains characters that expect interprets");
        eprintln!(
            "{} Passphrase for '{}' contains {}, {} or unbalanced {}; signing will likely fail",
            "⚠".yellow().bold(),
            args.name,
            "\" [ $ \\".yellow(),
            "a line break".yellow(),
            "{ }".yellow()
        );
    }

    let master_key = load_or_create_master_key(config)?;
    let record = SigningKeyRecord::seal(args.name.trim(), &private_key, &passphrase, &master_key)
        .context("Failed to seal signing key")?;
    record
        .validate(&master_key)
        .context("Refusing to store incomplete signing key")?;

    let store = open_store(config)?;
    let replacing = store.lookup(&record.name).is_some();
    store.upsert(record).context("Failed to save key store")?;

    if should_print(cli, LogLevel::Info) {
        println!(
            "{} {} signing key {}",
            "✓".green().bold(),
            if replacing { "Replaced" } else { "Stored" },
            args.name.trim().cyan()
        );
    }
    Ok(())
}

fn list_keys(config: &DebsignConfig, cli: &Cli) -> Result<()> {
    let store = open_store(config)?;
    let names = store.names();

    if names.is_empty() {
        if should_print(cli, LogLevel::Info) {
            println!("No signing keys configured in {}", store.path().display());
        }
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn remove_key(name: &str, config: &DebsignConfig, cli: &Cli) -> Result<()> {
    let store = open_store(config)?;
    if !store.remove(name).context("Failed to save key store")? {
        anyhow::bail!("No signing key named '{}'", name);
    }

    if should_print(cli, LogLevel::Info) {
        println!("{} Removed signing key {}", "✓".green().bold(), name.cyan());
    }
    Ok(())
}
