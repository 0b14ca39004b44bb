//! Binary-level tests for config loading and validation failures.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ebdeploy(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ebdeploy"));
    cmd.env("NO_COLOR", "1")
        .env_remove("EBDEPLOY_CONFIG")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .env_remove("AWS_DEFAULT_REGION")
        .arg("--config")
        .arg(config);
    cmd
}

fn write_config(body: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ebs.config");
    std::fs::write(&path, body).unwrap();
    (dir, path)
}

const VALID: &str = r"
aws:
  access_key: AKIAEXAMPLE
  secret_key: s3cr3t
  region: us-west-2
  bucket: my-bucket
app:
  app_name: my-app
  environments:
    my-app-prod: {}
";

fn json_error(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("run ebdeploy");
    assert_eq!(output.status.code(), Some(1));
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON error object")
}

#[test]
fn missing_config_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.config");
    ebdeploy(&path)
        .arg("list-environments")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: cannot read config file"))
        .stderr(predicate::str::contains("nope.config"));
}

#[test]
fn missing_config_file_with_json_prints_error_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.config");
    let value = json_error(ebdeploy(&path).args(["--json", "list-environments"]));
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "error");
    assert!(
        value["message"]
            .as_str()
            .unwrap()
            .contains("cannot read config file")
    );
}

#[test]
fn malformed_yaml_is_reported() {
    let (_dir, path) = write_config("app: [unterminated");
    ebdeploy(&path)
        .arg("list-environments")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}

#[test]
fn missing_app_name_is_rejected() {
    let (_dir, path) = write_config("aws:\n  bucket: b\n");
    ebdeploy(&path)
        .arg("cleanup-versions")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing required setting: app.app_name"));
}

#[test]
fn invalid_exclude_pattern_is_rejected() {
    let (_dir, path) =
        write_config("app:\n  app_name: my-app\n  archive:\n    excludes: ['(unclosed']\n");
    ebdeploy(&path)
        .arg("deploy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid exclude pattern '(unclosed'"));
}

#[test]
fn missing_credentials_are_rejected_before_any_call() {
    let (_dir, path) = write_config("aws:\n  bucket: b\napp:\n  app_name: my-app\n");
    ebdeploy(&path)
        .arg("list-environments")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("aws.access_key"));
}

#[test]
fn unknown_environment_has_a_stable_json_code() {
    let (_dir, path) = write_config(VALID);
    let value = json_error(ebdeploy(&path).args(["--json", "deploy", "-e", "my-app-qa"]));
    assert_eq!(value["code"], "unknown_environment");
    assert!(value["message"].as_str().unwrap().contains("my-app-qa"));
}

#[test]
fn unknown_environment_in_human_mode() {
    let (_dir, path) = write_config(VALID);
    ebdeploy(&path)
        .args(["wait-for", "-e", "my-app-qa"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Environment 'my-app-qa' is not defined in the config file.",
        ));
}

#[test]
fn config_path_can_come_from_the_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("from-env.config");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ebdeploy"));
    cmd.env("NO_COLOR", "1")
        .env("EBDEPLOY_CONFIG", &path)
        .arg("list-environments")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("from-env.config"));
}
