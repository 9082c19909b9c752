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

use anyhow::{Context, Result};
use clap::Parser;
use debsignctl::*;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    apply_color_choice(&cli.color);

    // Config commands inspect the file themselves, so a broken file can still be replaced
    if let Commands::Config(ref command) = cli.command {
        init_logging(&cli, "info")?;
        let ok = handle_config_command(command, cli.config.as_deref())?;
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let config = ConfigLoader::new()
        .load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&cli, &config.logging.level)?;
    config.validate().context("Invalid configuration")?;

    let code = match cli.command {
        Commands::Key(ref command) => {
            handle_key_command(command, &config, &cli)?;
            ExitCode::SUCCESS
        }
        Commands::Sign(ref args) => ExitCode::from(run_sign(args, &config, &cli).await?.exit_code()),
        Commands::Check(ref args) => {
            if run_check(args, &cli)? {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Config(_) => ExitCode::SUCCESS,
    };

    Ok(code)
}
