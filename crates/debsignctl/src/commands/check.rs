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

use crate::cli::{CheckArgs, Cli};
use crate::utils::{should_print, LogLevel};
use anyhow::{Context, Result};
use colored::Colorize;
use debsign::{ArtifactResolver, PatternCheck};

/// Print what each mask matches. Returns `false` if any mask is invalid.
pub fn run_check(args: &CheckArgs, cli: &Cli) -> Result<bool> {
    let resolver = ArtifactResolver::new(&args.workspace);
    let report = resolver
        .check(&args.include)
        .with_context(|| format!("Cannot inspect workspace {}", args.workspace.display()))?;

    if report.is_empty() {
        println!("{} No patterns given", "⚠".yellow().bold());
        return Ok(true);
    }

    let mut all_valid = true;
    for (pattern, status) in report {
        match status {
            PatternCheck::Matches(count) => {
                println!(
                    "{} {}: {} file{}",
                    "✓".green().bold(),
                    pattern.cyan(),
                    count,
                    if count == 1 { "" } else { "s" }
                );
                if should_print(cli, LogLevel::Debug) {
                    for path in resolver.resolve_pattern(&pattern)? {
                        println!("    {}", path.display());
                    }
                }
            }
            PatternCheck::NoMatch => {
                println!("{} {}: no match", "→".yellow(), pattern.cyan());
            }
            PatternCheck::Invalid(reason) => {
                all_valid = false;
                println!("{} {}: {}", "✗".red().bold(), pattern.cyan(), reason.red());
            }
        }
    }
    Ok(all_valid)
}
