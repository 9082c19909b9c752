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

//! Key store persistence across process restarts.

use crate::support::{PASSPHRASE, PRIVATE_KEY};
use debsign::{KeyStore, MasterKey, SecretError, SigningKeyRecord};

#[test]
fn test_records_survive_reload_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let master_key = MasterKey::load_or_create(&dir.path().join("master.key")).unwrap();
    let path = dir.path().join("keys.toml");

    let store = KeyStore::load(&path).unwrap();
    for name in ["release", "backports", "nightly"] {
        store
            .upsert(SigningKeyRecord::seal(name, PRIVATE_KEY, PASSPHRASE, &master_key).unwrap())
            .unwrap();
    }
    drop(store);

    let master_key = MasterKey::load_or_create(&dir.path().join("master.key")).unwrap();
    let reloaded = KeyStore::load(&path).unwrap();

    assert_eq!(reloaded.names(), vec!["release", "backports", "nightly"]);
    let record = reloaded.lookup("backports").unwrap();
    assert_eq!(record.private_key.reveal(&master_key).unwrap(), PRIVATE_KEY);
    assert_eq!(record.passphrase.reveal(&master_key).unwrap(), PASSPHRASE);
}

#[test]
fn test_store_file_holds_no_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let master_key = MasterKey::generate();
    let path = dir.path().join("keys.toml");

    let store = KeyStore::load(&path).unwrap();
    store
        .upsert(SigningKeyRecord::seal("release", PRIVATE_KEY, PASSPHRASE, &master_key).unwrap())
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[[key]]"));
    assert!(content.contains("name = \"release\""));
    assert!(!content.contains(PASSPHRASE));
    assert!(!content.contains("PGP PRIVATE KEY"));
}

#[test]
fn test_other_master_key_cannot_reveal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.toml");
    let store = KeyStore::load(&path).unwrap();
    store
        .upsert(
            SigningKeyRecord::seal("release", PRIVATE_KEY, PASSPHRASE, &MasterKey::generate())
                .unwrap(),
        )
        .unwrap();

    let record = KeyStore::load(&path).unwrap().lookup("release").unwrap();

    assert!(matches!(
        record.passphrase.reveal(&MasterKey::generate()),
        Err(SecretError::DecryptionFailed(_))
    ));
}

#[test]
fn test_remove_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let master_key = MasterKey::generate();
    let path = dir.path().join("keys.toml");

    let store = KeyStore::load(&path).unwrap();
    for name in ["release", "nightly"] {
        store
            .upsert(SigningKeyRecord::seal(name, PRIVATE_KEY, PASSPHRASE, &master_key).unwrap())
            .unwrap();
    }
    assert!(store.remove("release").unwrap());
    assert!(!store.remove("release").unwrap());

    let reloaded = KeyStore::load(&path).unwrap();
    assert_eq!(reloaded.names(), vec!["nightly"]);
    assert!(reloaded.lookup("release").is_none());
}
