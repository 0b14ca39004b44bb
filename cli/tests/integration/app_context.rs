//! `AppContext` construction and session building.
//!
//! IMPORTANT: These tests mutate process env vars (`CI`, `AWS_*`) and are
//! serialized with `serial_test`.

#![allow(clippy::expect_used, clippy::unwrap_used, unsafe_code)]

use std::path::PathBuf;

use ebdeploy_cli::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags, OutputMode};
use ebdeploy_cli::domain::retention::DEFAULT_VERSIONS_TO_KEEP;
use serial_test::serial;
use tempfile::TempDir;

const AWS_VARS: [&str; 3] = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_DEFAULT_REGION"];

fn flags(config: PathBuf, json: bool, yes: bool) -> AppFlags {
    AppFlags {
        output: OutputFlags {
            no_color: true,
            quiet: false,
            json,
        },
        behaviour: BehaviourFlags { yes, config },
    }
}

fn write_config(body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("ebs.config");
    std::fs::write(&path, body).expect("write config");
    (dir, path)
}

fn clear_env() {
    // SAFETY: every test touching these vars is #[serial].
    unsafe {
        std::env::remove_var("CI");
        for var in AWS_VARS {
            std::env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn json_mode_silences_progress_output() {
    clear_env();
    let app = AppContext::new(&flags(PathBuf::from("ebs.config"), true, false));
    assert_eq!(app.mode, OutputMode::Json);
    assert!(app.is_json());
    assert!(app.output.quiet);
    assert!(!app.non_interactive);
}

#[test]
#[serial]
fn ci_env_var_makes_context_non_interactive() {
    clear_env();
    // SAFETY: serialized.
    unsafe { std::env::set_var("CI", "true") };
    let app = AppContext::new(&flags(PathBuf::from("ebs.config"), false, false));
    assert!(app.non_interactive);
    assert!(app.confirm("Delete everything?", false).is_ok_and(|v| !v));
    clear_env();
}

#[test]
#[serial]
fn yes_flag_skips_prompts_with_default() {
    clear_env();
    let app = AppContext::new(&flags(PathBuf::from("ebs.config"), false, true));
    assert!(app.non_interactive);
    assert!(app.confirm("Continue?", true).unwrap());
}

#[test]
#[serial]
fn session_falls_back_to_aws_env_vars() {
    clear_env();
    // SAFETY: serialized.
    unsafe {
        std::env::set_var("AWS_ACCESS_KEY_ID", "AKIAFROMENV");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "env-secret");
        std::env::set_var("AWS_DEFAULT_REGION", "eu-central-1");
    }
    let (_dir, path) = write_config(
        "aws:\n  bucket: my-bucket\n  bucket_path: releases\napp:\n  app_name: my-app\n",
    );

    let app = AppContext::new(&flags(path, false, true));
    let session = app.session().unwrap();

    assert_eq!(session.application(), "my-app");
    assert_eq!(session.credentials.access_key(), "AKIAFROMENV");
    assert_eq!(session.credentials.region(), "eu-central-1");
    assert_eq!(session.credentials.object_key("v1.zip"), "releases/v1.zip");
    assert_eq!(session.config.app.versions_to_keep, DEFAULT_VERSIONS_TO_KEEP);
    assert!(!format!("{:?}", session.credentials).contains("env-secret"));
    clear_env();
}

#[test]
#[serial]
fn config_values_win_over_env_vars() {
    clear_env();
    // SAFETY: serialized.
    unsafe { std::env::set_var("AWS_DEFAULT_REGION", "eu-central-1") };
    let (_dir, path) = write_config(
        "aws:\n  access_key: AKIA\n  secret_key: s\n  region: us-west-2\n  bucket: b\napp:\n  app_name: my-app\n",
    );

    let session = AppContext::new(&flags(path, false, true)).session().unwrap();
    assert_eq!(session.credentials.region(), "us-west-2");
    clear_env();
}

#[test]
#[serial]
fn session_without_credentials_fails() {
    clear_env();
    let (_dir, path) = write_config("aws:\n  bucket: b\napp:\n  app_name: my-app\n");

    let err = AppContext::new(&flags(path, false, true))
        .session()
        .err()
        .expect("missing credentials");
    assert!(format!("{err:#}").contains("aws.access_key"));
}
