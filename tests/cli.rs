//! CLI integration tests for batoms-build.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command to run batoms-build.
#[allow(deprecated)]
fn batoms_build() -> Command {
    Command::cargo_bin("batoms-build").unwrap()
}

#[test]
fn test_help() {
    batoms_build()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Build Blender extension archives for Beautiful Atoms",
        ))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("platform"))
        .stdout(predicate::str::contains("locate"))
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn test_version() {
    batoms_build()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_build_help() {
    batoms_build()
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Build wheels and package the Blender extension",
        ))
        .stdout(predicate::str::contains("--repo-root"))
        .stdout(predicate::str::contains("--pyproject"))
        .stdout(predicate::str::contains("--manifest"))
        .stdout(predicate::str::contains("--build-dir"))
        .stdout(predicate::str::contains("--export-dir"))
        .stdout(predicate::str::contains("--index-url"))
        .stdout(predicate::str::contains("--extra-wheels"))
        .stdout(predicate::str::contains("--only-compress-wheels"));
}

#[test]
fn test_compress_with_extra_wheels_is_rejected() {
    let temp = TempDir::new().unwrap();
    let extra = temp.path().join("macos-wheels");
    std::fs::create_dir(&extra).unwrap();

    batoms_build()
        .current_dir(temp.path())
        .args(["--blender", "/nonexistent/blender", "build", "--repo-root"])
        .arg(temp.path())
        .arg("-z")
        .arg("--extra-wheels")
        .arg(&extra)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error: only_compress_wheels"));

    assert!(!temp.path().join("build").exists());
    assert!(!temp.path().join("export").exists());
}

#[test]
fn test_build_missing_repo_root() {
    batoms_build()
        .args(["build", "--repo-root", "/definitely/not/a/repo"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cannot access repository root"));
}

#[test]
fn test_missing_blender_path() {
    let temp = TempDir::new().unwrap();
    batoms_build()
        .current_dir(temp.path())
        .args(["--blender", "/nonexistent/blender", "snapshot"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Blender not found at specified path"));
}

#[test]
fn test_platform() {
    batoms_build()
        .arg("platform")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^(linux-x64|macos-x64|macos-arm64|windows-x64|unsupported)\n$").unwrap());
}

#[test]
fn test_platform_underscore() {
    batoms_build()
        .args(["platform", "--connector", "_"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-").not());
}

#[test]
fn test_invalid_subcommand() {
    batoms_build()
        .arg("invalid-subcommand")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_no_subcommand() {
    batoms_build()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_global_blender_option() {
    batoms_build()
        .args(["--blender", "/path/to/blender", "build", "--help"])
        .assert()
        .success();
}

#[test]
fn test_completions_bash() {
    batoms_build()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_batoms-build()"));
}

#[test]
fn test_completions_zsh() {
    batoms_build()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef batoms-build"));
}
