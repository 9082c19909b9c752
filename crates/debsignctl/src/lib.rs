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

//! Library side of `debsignctl`, exposed for integration tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod utils;

pub use cli::*;
pub use commands::check::run_check;
pub use commands::config::handle_config_command;
pub use commands::key::handle_key_command;
pub use commands::sign::{run_sign, SignStatus};
pub use config::{ConfigLoader, DebsignConfig, Validate};
pub use utils::{apply_color_choice, init_logging};
