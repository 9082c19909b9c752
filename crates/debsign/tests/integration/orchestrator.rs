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

//! Signing run tests against a recording launcher.

use crate::support::{
    build_orchestrator, script_of, spawn_line, touch, RecordingLauncher, PASSPHRASE, PRIVATE_KEY,
};
use debsign::{
    BuildContext, BuildResult, BuildStep, LaunchError, SignError, SignJob, SignTask, StepOutcome,
};
use std::collections::HashMap;
use tracing_test::traced_test;

fn job(key_name: &str, includes: &str) -> SignJob {
    SignJob {
        entries: vec![SignTask {
            key_name: key_name.to_string(),
            includes: includes.to_string(),
            cmdline_opts: String::new(),
        }],
    }
}

#[tokio::test]
async fn test_unknown_key_fails_before_any_artifact() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "pkg_1.0_amd64.deb");

    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());
    let ctx = BuildContext::new(workspace.path());

    let result = orchestrator.run(&job("missing", "*.deb"), &ctx).await;

    match result {
        Err(SignError::KeyUnavailable { key_name }) => assert_eq!(key_name, "missing"),
        other => panic!("Expected KeyUnavailable, got {:?}", other),
    }
    assert!(orchestrator.launcher().calls().is_empty());
}

#[tokio::test]
async fn test_unverifiable_key_fails_before_any_artifact() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "pkg_1.0_amd64.deb");

    let launcher = RecordingLauncher::new(|spec| {
        if spec.args.first().map(String::as_str) == Some("--fingerprint") {
            Ok(2)
        } else {
            Ok(0)
        }
    });
    let (_store_dir, orchestrator) = build_orchestrator(&["release"], launcher);
    let ctx = BuildContext::new(workspace.path());

    let result = orchestrator.run(&job("release", "*.deb"), &ctx).await;

    assert!(matches!(result, Err(SignError::KeyUnavailable { .. })));
    assert!(orchestrator.launcher().calls_to("expect").is_empty());
    // Import was still attempted before the verify gate
    assert_eq!(orchestrator.launcher().calls_to("gpg").len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_keyring_query_that_cannot_start_names_the_key() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "pkg_1.0_amd64.deb");

    let launcher = RecordingLauncher::new(|spec| {
        if spec.args.first().map(String::as_str) == Some("--fingerprint") {
            Err(LaunchError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no gpg"),
            })
        } else {
            Ok(0)
        }
    });
    let (_store_dir, orchestrator) = build_orchestrator(&["release"], launcher);

    let result = orchestrator
        .run(&job("release", "*.deb"), &BuildContext::new(workspace.path()))
        .await;

    match result {
        Err(SignError::KeyUnavailable { key_name }) => assert_eq!(key_name, "release"),
        other => panic!("Expected KeyUnavailable, got {:?}", other),
    }
    assert!(orchestrator.launcher().calls_to("expect").is_empty());
    assert!(logs_contain("Can't find GPG key: release"));
}

#[tokio::test]
async fn test_empty_key_name_is_unavailable() {
    let workspace = tempfile::tempdir().unwrap();
    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());

    let result = orchestrator
        .run(&job("", "*.deb"), &BuildContext::new(workspace.path()))
        .await;

    assert!(matches!(result, Err(SignError::KeyUnavailable { .. })));
}

#[tokio::test]
#[traced_test]
async fn test_no_matching_files_logs_notice_and_succeeds() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "README.md");

    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());
    let ctx = BuildContext::new(workspace.path());

    let outcome = orchestrator
        .run(&job("release", "*.deb"), &ctx)
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::Completed { signed: vec![] });
    assert!(logs_contain("No DEBs matching *.deb"));
    assert!(orchestrator.launcher().calls_to("expect").is_empty());
}

#[tokio::test]
async fn test_second_artifact_failure_stops_the_run() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a_1.0_amd64.deb");
    touch(workspace.path(), "b_1.0_amd64.deb");
    touch(workspace.path(), "c_1.0_amd64.deb");

    let launcher = RecordingLauncher::new(|spec| {
        if spec.program == "expect" && spawn_line(spec).contains("b_1.0_amd64.deb") {
            Ok(1)
        } else {
            Ok(0)
        }
    });
    let (_store_dir, orchestrator) = build_orchestrator(&["release"], launcher);
    let ctx = BuildContext::new(workspace.path());

    let result = orchestrator.run(&job("release", "*.deb"), &ctx).await;

    match result {
        Err(SignError::SigningFailed {
            artifact,
            exit_code,
            signed,
        }) => {
            assert!(artifact.ends_with("b_1.0_amd64.deb"));
            assert_eq!(exit_code, 1);
            assert_eq!(signed.len(), 1);
            assert!(signed[0].ends_with("a_1.0_amd64.deb"));
        }
        other => panic!("Expected SigningFailed, got {:?}", other),
    }

    let signing_calls = orchestrator.launcher().calls_to("expect");
    assert_eq!(signing_calls.len(), 2);
    assert!(!signing_calls
        .iter()
        .any(|spec| spawn_line(spec).contains("c_1.0_amd64.deb")));
}

#[tokio::test]
async fn test_failure_in_first_entry_skips_remaining_entries() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a.deb");

    let launcher = RecordingLauncher::new(|spec| Ok(if spec.program == "expect" { 5 } else { 0 }));
    let (_store_dir, orchestrator) = build_orchestrator(&["release", "backports"], launcher);
    let job = SignJob {
        entries: vec![
            SignTask {
                key_name: "release".to_string(),
                includes: "*.deb".to_string(),
                cmdline_opts: String::new(),
            },
            SignTask {
                key_name: "backports".to_string(),
                includes: "*.deb".to_string(),
                cmdline_opts: String::new(),
            },
        ],
    };

    let result = orchestrator
        .run(&job, &BuildContext::new(workspace.path()))
        .await;

    assert!(matches!(
        result,
        Err(SignError::SigningFailed { exit_code: 5, .. })
    ));
    let calls = orchestrator.launcher().calls();
    assert!(!calls
        .iter()
        .any(|spec| spec.args.iter().any(|a| a == "backports")));
}

#[tokio::test]
async fn test_broken_build_is_skipped_without_launching() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a.deb");

    for result in [BuildResult::Failure, BuildResult::NotBuilt, BuildResult::Aborted] {
        let (_store_dir, orchestrator) =
            build_orchestrator(&["release"], RecordingLauncher::succeeding());
        let ctx = BuildContext::new(workspace.path()).with_result(result);

        let outcome = orchestrator
            .run(&job("missing-key", "*.deb"), &ctx)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Skipped);
        assert!(orchestrator.launcher().calls().is_empty());
    }
}

#[tokio::test]
async fn test_unstable_build_is_signed() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a.deb");

    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());
    let ctx = BuildContext::new(workspace.path()).with_result(BuildResult::Unstable);

    let outcome = orchestrator
        .run(&job("release", "*.deb"), &ctx)
        .await
        .unwrap();

    assert!(matches!(outcome, StepOutcome::Completed { signed } if signed.len() == 1));
}

#[tokio::test]
async fn test_process_invocations_in_order() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "dist/pkg_2.0_all.deb");

    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());
    let mut env = HashMap::new();
    env.insert("GNUPGHOME".to_string(), "/build/.gnupg".to_string());
    let ctx = BuildContext::new(workspace.path()).with_env(env);
    let job = SignJob {
        entries: vec![SignTask {
            key_name: "release".to_string(),
            includes: "dist/*.deb".to_string(),
            cmdline_opts: " --verbose  -m 5 ".to_string(),
        }],
    };

    orchestrator.run(&job, &ctx).await.unwrap();

    let calls = orchestrator.launcher().calls();
    assert_eq!(calls.len(), 3);

    let import = &calls[0];
    assert_eq!(import.program, "gpg");
    assert_eq!(import.args, vec!["--import", "-"]);
    assert_eq!(import.stdin.as_deref(), Some(PRIVATE_KEY.as_bytes()));

    let verify = &calls[1];
    assert_eq!(verify.args, vec!["--fingerprint", "release"]);
    assert!(verify.stdin.is_none());

    let sign = &calls[2];
    assert_eq!(sign.program, "expect");
    assert_eq!(sign.args, vec!["-"]);
    let artifact = std::fs::canonicalize(workspace.path())
        .unwrap()
        .join("dist/pkg_2.0_all.deb");
    assert_eq!(
        spawn_line(sign),
        format!(
            "spawn debsigs --sign=origin -k release --verbose -m 5 {}",
            artifact.display()
        )
    );

    for spec in &calls {
        assert_eq!(spec.current_dir, workspace.path());
        assert_eq!(
            spec.envs.get("GNUPGHOME").map(String::as_str),
            Some("/build/.gnupg")
        );
    }
}

#[tokio::test]
#[traced_test]
async fn test_passphrase_only_reaches_the_script() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a.deb");

    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());

    orchestrator
        .run(&job("release", "*.deb"), &BuildContext::new(workspace.path()))
        .await
        .unwrap();

    let calls = orchestrator.launcher().calls();
    for spec in &calls {
        assert!(!spec.args.iter().any(|arg| arg.contains(PASSPHRASE)));
        assert!(!format!("{:?}", spec).contains(PASSPHRASE));
    }

    let sign = orchestrator.launcher().calls_to("expect").remove(0);
    let script = script_of(&sign);
    assert_eq!(script.matches(&format!("{}\\r", PASSPHRASE)).count(), 1);

    assert!(!logs_contain(PASSPHRASE));
    assert!(!logs_contain("lQOYBGZ"));
}

#[tokio::test]
async fn test_import_failure_is_not_fatal() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a.deb");

    let launcher = RecordingLauncher::new(|spec| {
        if spec.args.first().map(String::as_str) == Some("--import") {
            Err(LaunchError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "keyring locked"),
            })
        } else {
            Ok(0)
        }
    });
    let (_store_dir, orchestrator) = build_orchestrator(&["release"], launcher);

    let outcome = orchestrator
        .run(&job("release", "*.deb"), &BuildContext::new(workspace.path()))
        .await
        .unwrap();

    assert!(matches!(outcome, StepOutcome::Completed { signed } if signed.len() == 1));
}

#[tokio::test]
async fn test_interruption_propagates() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "a.deb");
    touch(workspace.path(), "b.deb");

    let launcher = RecordingLauncher::new(|spec| {
        if spec.program == "expect" {
            Err(LaunchError::Interrupted {
                program: spec.program.clone(),
            })
        } else {
            Ok(0)
        }
    });
    let (_store_dir, orchestrator) = build_orchestrator(&["release"], launcher);

    let result = orchestrator
        .run(&job("release", "*.deb"), &BuildContext::new(workspace.path()))
        .await;

    assert!(matches!(result, Err(SignError::Interrupted)));
    assert_eq!(orchestrator.launcher().calls_to("expect").len(), 1);
}

#[tokio::test]
async fn test_patterns_processed_in_order() {
    let workspace = tempfile::tempdir().unwrap();
    touch(workspace.path(), "z/last.deb");
    touch(workspace.path(), "a/first.deb");

    let (_store_dir, orchestrator) =
        build_orchestrator(&["release"], RecordingLauncher::succeeding());

    let outcome = orchestrator
        .run(
            &job("release", "z/*.deb, missing/*.deb, a/*.deb"),
            &BuildContext::new(workspace.path()),
        )
        .await
        .unwrap();

    match outcome {
        StepOutcome::Completed { signed } => {
            assert_eq!(signed.len(), 2);
            assert!(signed[0].ends_with("z/last.deb"));
            assert!(signed[1].ends_with("a/first.deb"));
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}
