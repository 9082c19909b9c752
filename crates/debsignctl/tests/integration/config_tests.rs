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

use debsignctl::config::{ConfigError, ConfigLoader, DebsignConfig, Validate, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;

#[test]
#[serial]
fn test_explicit_file_wins_over_env_and_search() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("explicit.toml");
    let from_env = dir.path().join("env.toml");
    let searched = dir.path().join("debsign.toml");
    fs::write(&explicit, "[tools]\ngpg = \"gpg-explicit\"\n").unwrap();
    fs::write(&from_env, "[tools]\ngpg = \"gpg-env\"\n").unwrap();
    fs::write(&searched, "[tools]\ngpg = \"gpg-searched\"\n").unwrap();

    let loader = ConfigLoader::with_search_paths(vec![searched.clone()]);
    env::set_var(CONFIG_ENV_VAR, &from_env);

    assert_eq!(
        loader.load_config(Some(explicit.as_path())).unwrap().tools.gpg,
        "gpg-explicit"
    );
    assert_eq!(loader.load_config(None).unwrap().tools.gpg, "gpg-env");

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(loader.load_config(None).unwrap().tools.gpg, "gpg-searched");
}

#[test]
#[serial]
fn test_partial_file_keeps_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("debsign.toml");
    fs::write(
        &path,
        "[store]\nkeys_file = \"/srv/debsign/keys.toml\"\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config = ConfigLoader::with_search_paths(vec![path]).load_config(None).unwrap();
    let defaults = DebsignConfig::default();

    assert_eq!(config.store.keys_file, PathBuf::from("/srv/debsign/keys.toml"));
    assert_eq!(config.store.master_key_file, defaults.store.master_key_file);
    assert_eq!(config.tools, defaults.tools);
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_substitution_in_file() {
    env::set_var("DEBSIGN_TEST_STORE", "/srv/signing");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("debsign.toml");
    fs::write(
        &path,
        "[store]\nkeys_file = \"${DEBSIGN_TEST_STORE}/keys.toml\"\nmaster_key_file = \"${DEBSIGN_TEST_UNSET:-/etc/debsign}/master.key\"\n",
    )
    .unwrap();

    let config = ConfigLoader::new().load_config(Some(path.as_path())).unwrap();
    env::remove_var("DEBSIGN_TEST_STORE");

    assert_eq!(config.store.keys_file, PathBuf::from("/srv/signing/keys.toml"));
    assert_eq!(
        config.store.master_key_file,
        PathBuf::from("/etc/debsign/master.key")
    );
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::new().load_config(Some(dir.path().join("absent.toml").as_path()));

    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("debsign.toml");
    fs::write(&path, "[tools\ngpg = ").unwrap();

    assert!(matches!(
        ConfigLoader::new().load_config(Some(path.as_path())),
        Err(ConfigError::TomlParseError(_))
    ));
}

#[test]
fn test_generated_default_parses_back() {
    let content = debsignctl::config::defaults::generate_default_config_toml().unwrap();
    let parsed: DebsignConfig = toml::from_str(&content).unwrap();

    assert_eq!(parsed, DebsignConfig::default());
    assert!(content.contains("[tools]"));
    assert!(content.contains("expect = \"expect\""));
}
