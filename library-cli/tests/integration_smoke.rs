//! Smoke tests to verify command module wiring

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn library() -> Command {
    let mut cmd = Command::cargo_bin("library").unwrap();
    cmd.env_remove("DATABASE_URL")
        .env_remove("LIBRARY_SESSION_SECRET")
        .env_remove("LIBRARY_BIND");
    cmd
}

#[test]
fn test_serve_help() {
    library()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--in-memory"));
}

#[test]
fn test_migrate_help() {
    library()
        .arg("migrate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database URL"));
}

#[test]
fn test_config_path_honors_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    library()
        .env("LIBRARY_CONFIG", &path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    library()
        .env("LIBRARY_CONFIG", &path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    // second init refuses without --force
    library()
        .env("LIBRARY_CONFIG", &path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    library()
        .env("LIBRARY_CONFIG", &path)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("development default"));
}

#[test]
fn test_config_show_masks_secret() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    library()
        .env("LIBRARY_CONFIG", &path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("library-dev-secret").not());
}
