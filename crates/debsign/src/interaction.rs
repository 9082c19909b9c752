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

//! `expect` scripts that answer the signing tool's passphrase prompt.
//!
//! The generated script runs this state machine:
//!
//! ```text
//! spawn ──► AwaitPrompt ──prompt──► send passphrase (log_user 0) ──► AwaitExit ──eof──► exit <child code>
//!               │  └──eof──────────────────────────────────────────────►┘    └──timeout──► exit 1
//!               └──timeout──► close, exit 1
//! ```
//!
//! The passphrase only ever appears inside the `send` directive, which is fed
//! to the interpreter on stdin. It is inserted verbatim between double quotes,
//! so a passphrase containing `"`, `[`, `$`, `\`, a line break, or unbalanced
//! braces changes the meaning of the script. [`is_script_safe`] screens for those.

use std::fmt;

/// Case-insensitive prompt pattern, in Tcl regular-expression syntax.
pub const PASSPHRASE_PROMPT: &str = r"Enter pass\s*phrase:\s*";

/// Seconds the interpreter waits at each `expect` before giving up.
pub const INTERACTION_TIMEOUT_SECS: u32 = 10;

/// Characters that change the meaning of the `send` directive.
pub const SCRIPT_SPECIAL_CHARS: &[char] = &['"', '[', '$', '\\', '\n', '\r'];

/// Whether `passphrase` survives insertion into a script unchanged.
///
/// The `send` directive sits inside a braced action body, so unbalanced
/// braces end the body early even though the passphrase is quoted.
pub fn is_script_safe(passphrase: &str) -> bool {
    !passphrase.contains(SCRIPT_SPECIAL_CHARS) && braces_balanced(passphrase)
}

/// Whether every `}` in `word` closes an earlier `{` and none stay open.
fn braces_balanced(word: &str) -> bool {
    let mut depth = 0usize;
    for c in word.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// A program and its arguments, kept as separate words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `raw` split on whitespace.
    pub fn tokenized(self, raw: &str) -> Self {
        self.args(raw.split_whitespace())
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Render every word so Tcl reads it back unchanged.
    pub fn to_tcl(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| tcl_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Quote `word` for Tcl: bare when safe, braced when possible, backslashed otherwise.
fn tcl_word(word: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_-+=.,:/@%^~".contains(c);
    if !word.is_empty() && word.chars().all(is_safe) {
        return word.to_string();
    }

    if braces_balanced(word) && !word.contains('\\') {
        return format!("{{{}}}", word);
    }

    let mut escaped = String::with_capacity(word.len() * 2);
    for c in word.chars() {
        if c.is_ascii_alphanumeric() {
            escaped.push(c);
        } else {
            escaped.push('\\');
            escaped.push(c);
        }
    }
    escaped
}

/// Builds `expect` scripts for one signing invocation.
#[derive(Debug, Clone, Default)]
pub struct InteractionScriptBuilder;

impl InteractionScriptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the script that runs `command` and answers its passphrase prompt.
    pub fn build(&self, command: &CommandLine, passphrase: &str) -> Vec<u8> {
        let exit_with_child = "    eof { catch wait rc; exit [lindex $rc 3]; }";
        let abort = "    timeout { close; exit 1; }";
        let answer = format!(
            "    -nocase -re {{{}}} {{ log_user 0; send -- \"{}\\r\"; log_user 1; }}",
            PASSPHRASE_PROMPT, passphrase
        );

        let lines = [
            format!("set timeout {}", INTERACTION_TIMEOUT_SECS),
            format!("spawn {}", command.to_tcl()),
            "expect {".to_string(),
            answer,
            exit_with_child.to_string(),
            abort.to_string(),
            "}".to_string(),
            "expect {".to_string(),
            exit_with_child.to_string(),
            abort.to_string(),
            "}".to_string(),
        ];

        let mut script = lines.join("\n");
        script.push('\n');
        script.into_bytes()
    }
}
