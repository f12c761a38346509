//! Integration tests for `batoms-build clean` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command to run batoms-build.
#[allow(deprecated)]
fn batoms_build() -> Command {
    Command::cargo_bin("batoms-build").unwrap()
}

#[test]
fn test_clean_empty_directory() {
    let temp_dir = TempDir::new().unwrap();

    batoms_build()
        .args(["clean", "--repo-root", temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn test_clean_removes_build_and_export() {
    let temp_dir = TempDir::new().unwrap();
    let build_dir = temp_dir.path().join("build");
    let export_dir = temp_dir.path().join("export");
    fs::create_dir_all(build_dir.join("wheels")).unwrap();
    fs::write(build_dir.join("wheels/numpy-1.26.4-py3-none-any.whl"), "").unwrap();
    fs::create_dir(&export_dir).unwrap();
    fs::write(export_dir.join("batoms-2.3.0-linux_x64.zip"), "").unwrap();

    batoms_build()
        .args(["clean", "--repo-root", temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleting:"))
        .stdout(predicate::str::contains("Cleaned 2 item"));

    assert!(!build_dir.exists());
    assert!(!export_dir.exists());
}

#[test]
fn test_clean_dry_run_shows_but_does_not_delete() {
    let temp_dir = TempDir::new().unwrap();
    let build_dir = temp_dir.path().join("build");
    fs::create_dir(&build_dir).unwrap();

    batoms_build()
        .args([
            "clean",
            "--dry-run",
            "--repo-root",
            temp_dir.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("Would delete:"))
        .stdout(predicate::str::contains("Would delete 1 item"));

    assert!(build_dir.exists());
}

#[test]
fn test_clean_keeps_sources() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("batoms");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("__init__.py"), "").unwrap();
    fs::create_dir(temp_dir.path().join("build")).unwrap();

    batoms_build()
        .args(["clean", "--repo-root", temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned 1 item"));

    assert!(source.join("__init__.py").exists());
    assert!(!temp_dir.path().join("build").exists());
}
