//! CLI integration tests for podgen.
//!
//! These tests drive the binary from podspec discovery through writing the
//! generated Podfile.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const SPEC_A: &str = r#"{
    "name": "A",
    "version": "1.0.0",
    "platforms": {"ios": "10.0", "osx": "10.12"},
    "dependencies": {"B": [">= 1.0"]},
    "testspecs": [{"name": "Tests", "test_type": "unit"}]
}"#;

/// Get the podgen binary command, isolated from the user's environment.
fn podgen(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("podgen").unwrap();
    cmd.current_dir(cwd)
        .env("CP_HOME_DIR", cwd.join(".cocoapods"))
        .env_remove("COCOAPODS_GENERATE_USE_LIBRARIES")
        .env_remove("COCOAPODS_GENERATE_SOURCES")
        .env_remove("COCOAPODS_GENERATE_PODSPEC_PATHS");
    cmd
}

fn temp_dir_with_spec() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("A.podspec.json"), SPEC_A).unwrap();
    tmp
}

// ============================================================================
// podgen gen
// ============================================================================

#[test]
fn test_gen_writes_podfile() {
    let tmp = temp_dir_with_spec();

    podgen(tmp.path())
        .arg("gen")
        .assert()
        .success()
        .stderr(predicate::str::contains("Generated"))
        .stderr(predicate::str::contains("App-iOS"));

    let podfile = fs::read_to_string(tmp.path().join("gen/A/Podfile.yaml")).unwrap();
    assert!(podfile.contains("A.xcworkspace"));
    assert!(podfile.contains("../../A.podspec.json"));
    assert!(podfile.contains("Transitive Dependencies"));
    assert!(podfile.contains("App-macOS"));
}

#[test]
fn test_gen_with_explicit_podspec_and_gen_directory() {
    let tmp = temp_dir_with_spec();
    let work = tmp.path().join("work");
    fs::create_dir_all(&work).unwrap();

    podgen(&work)
        .args(["gen", "../A.podspec.json", "--gen-directory", "out", "--platforms", "ios"])
        .assert()
        .success();

    let podfile = fs::read_to_string(work.join("out/A/Podfile.yaml")).unwrap();
    assert!(podfile.contains("App-iOS"));
    assert!(!podfile.contains("App-macOS"));
}

#[test]
fn test_gen_auto_open_names_workspace() {
    let tmp = temp_dir_with_spec();
    let workspace = tmp.path().join("gen/A/A.xcworkspace");

    podgen(tmp.path())
        .args(["gen", "--auto-open"])
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("Open {}", workspace.display())));
}

#[test]
fn test_gen_without_podspecs_fails() {
    let tmp = TempDir::new().unwrap();

    podgen(tmp.path())
        .arg("gen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid `pod gen` configuration"))
        .stderr(predicate::str::contains("no specs found"));

    assert!(!tmp.path().join("gen").exists());
}

#[test]
fn test_gen_rejects_unmatched_platforms() {
    let tmp = temp_dir_with_spec();

    podgen(tmp.path())
        .args(["gen", "--platforms", "watchos"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No available platforms in podspecs A match requested platforms: watchos",
        ));
}

#[test]
fn test_gen_rejects_invalid_platform_name() {
    let tmp = temp_dir_with_spec();

    podgen(tmp.path())
        .args(["gen", "--platforms", "android"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid for platforms"));
}

// ============================================================================
// podgen config
// ============================================================================

#[test]
fn test_config_layers() {
    let tmp = temp_dir_with_spec();
    fs::write(tmp.path().join(".gen_config.yml"), ":use_libraries: true\n").unwrap();

    podgen(tmp.path())
        .arg("config")
        .env("COCOAPODS_GENERATE_USE_LIBRARIES", "false")
        .env("COCOAPODS_GENERATE_SOURCES", "a,b")
        .assert()
        .success()
        .stdout(predicate::str::contains("use_libraries: true"))
        .stdout(predicate::str::contains("sources: [a, b]"))
        .stdout(predicate::str::contains("configuration is valid"));

    podgen(tmp.path())
        .args(["config", "--no-use-libraries", "--sources=x,y"])
        .env("COCOAPODS_GENERATE_SOURCES", "a,b")
        .assert()
        .success()
        .stdout(predicate::str::contains("use_libraries: false"))
        .stdout(predicate::str::contains("sources: [x, y]"));
}

#[test]
fn test_config_file_podspec_paths_survive_empty_positionals() {
    let tmp = TempDir::new().unwrap();
    let pods = tmp.path().join("Foo");
    fs::create_dir_all(&pods).unwrap();
    fs::write(pods.join("A.podspec.json"), SPEC_A).unwrap();
    fs::write(tmp.path().join(".gen_config.yml"), "podspec_paths:\n  - ./Foo\n").unwrap();

    podgen(tmp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("podspecs: [A (1.0.0)]"));
}

#[test]
fn test_config_reports_bad_config_file() {
    let tmp = temp_dir_with_spec();
    fs::write(tmp.path().join(".gen_config.yml"), "- not\n- a mapping\n").unwrap();

    podgen(tmp.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mapping not found in configuration"));
}

// ============================================================================
// podgen completions
// ============================================================================

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();

    podgen(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("podgen"))
        .stdout(predicate::str::contains("--use-libraries"));
}

#[test]
fn test_help_lists_options() {
    let tmp = TempDir::new().unwrap();

    podgen(tmp.path())
        .args(["gen", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--use-podfile"))
        .stdout(predicate::str::contains("--gen-directory <PATH>"));
}
