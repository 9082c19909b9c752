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

use crate::cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

/// Filter directive for the CLI flags, `RUST_LOG`, and the configured level, in that order.
pub fn filter_directive(
    verbose: bool,
    quiet: bool,
    rust_log: Option<String>,
    configured_level: &str,
) -> String {
    if quiet {
        "error".to_string()
    } else if verbose {
        "debug".to_string()
    } else {
        rust_log
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| configured_level.to_lowercase())
    }
}

/// Install the global subscriber. Log lines go to stderr so command output
/// on stdout stays clean.
pub fn init_logging(cli: &Cli, configured_level: &str) -> anyhow::Result<()> {
    let directive = filter_directive(
        cli.verbose,
        cli.quiet,
        std::env::var("RUST_LOG").ok(),
        configured_level,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()?;
    Ok(())
}

pub fn should_print(cli: &Cli, level: LogLevel) -> bool {
    match level {
        LogLevel::Error => true,
        LogLevel::Info => !cli.quiet,
        LogLevel::Debug => cli.verbose && !cli.quiet,
    }
}

/// Apply the `--color` choice to `colored` output.
pub fn apply_color_choice(choice: &str) {
    match choice {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => {}
    }
}
