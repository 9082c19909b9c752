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

use crate::cli::ConfigCommands;
use crate::config::validation::Validate;
use crate::config::{defaults, ConfigLoader, DebsignConfig};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle `config` subcommands. `Init` never reads an existing configuration.
pub fn handle_config_command(command: &ConfigCommands, config_file: Option<&Path>) -> Result<bool> {
    match command {
        ConfigCommands::Init { output, force } => {
            generate_config(output, *force)?;
            Ok(true)
        }
        ConfigCommands::Show => {
            show_config(config_file)?;
            Ok(true)
        }
        ConfigCommands::Validate => validate_config(config_file),
    }
}

pub fn generate_config(output_path: &Path, force: bool) -> Result<()> {
    if output_path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Configuration file '{}' already exists. Use --force to overwrite.",
            output_path.display()
        ));
    }

    let content = defaults::generate_default_config_toml()
        .context("Failed to generate TOML configuration")?;

    fs::write(output_path, content)
        .with_context(|| format!("Failed to write configuration to {}", output_path.display()))?;

    println!(
        "{} Generated default configuration: {}",
        "✓".green().bold(),
        output_path.display().to_string().cyan()
    );

    Ok(())
}

fn load(config_file: Option<&Path>) -> Result<(DebsignConfig, Option<PathBuf>)> {
    let loader = ConfigLoader::new();
    let source = loader.resolve_config_path(config_file);
    let config = loader
        .load_config(config_file)
        .context("Failed to load configuration")?;
    Ok((config, source))
}

fn validate_config(config_file: Option<&Path>) -> Result<bool> {
    let (config, _) = load(config_file)?;

    match config.validate() {
        Ok(()) => {
            println!("{} Configuration is valid", "✓".green().bold());
            Ok(true)
        }
        Err(validation_error) => {
            println!("{} Configuration validation failed:", "✗".red().bold());
            println!("  {}", validation_error.to_string().red());
            Ok(false)
        }
    }
}

fn show_config(config_file: Option<&Path>) -> Result<()> {
    let (config, source) = load(config_file)?;

    if let Err(validation_error) = config.validate() {
        println!(
            "{} Warning: Configuration has validation errors:",
            "⚠".yellow().bold()
        );
        println!("  {}", validation_error.to_string().yellow());
        println!();
    }

    match source {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# Built-in defaults"),
    }
    let content = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    print!("{}", content);
    Ok(())
}
