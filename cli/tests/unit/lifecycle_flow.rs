//! Environment lifecycle use-cases against the in-memory platform.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use ebdeploy_cli::application::services::environments::{
    delete_application, init, list_environments, rebuild, terminate, update_environments,
};
use ebdeploy_cli::application::services::retention::delete_unused_versions;
use ebdeploy_cli::domain::{DeployConfig, DeployError, WaitOptions};
use ebdeploy_common::{EnvironmentHealth, EnvironmentStatus, Severity, ValidationMessage};
use tokio::time::Instant;

use crate::helpers::{APP, Transcript, day, environment, version};
use crate::mocks::MemoryPlatform;

const CONFIG: &str = r"
app:
  app_name: my-app
  environments:
    my-app-prod:
      description: production
      option_settings:
        aws:autoscaling:asg:
          MinSize: 2
          MaxSize: 4
    my-app-staging: {}
";

fn config() -> DeployConfig {
    serde_yaml::from_str(CONFIG).unwrap()
}

fn wait(secs: u64) -> WaitOptions {
    WaitOptions::with_max_wait(Duration::from_secs(secs))
}

fn ready(name: &str) -> ebdeploy_common::EnvironmentDescription {
    environment(
        name,
        EnvironmentStatus::Ready,
        EnvironmentHealth::Green,
        Some("v1"),
    )
}

#[tokio::test(start_paused = true)]
async fn init_creates_application_and_missing_environments() {
    let config = config();
    let targets = config.environments(&[]).unwrap();
    let platform = MemoryPlatform::default()
        .with_environment(ready("my-app-prod"))
        .with_lag(0);
    let reporter = Transcript::default();
    let started = Instant::now();

    let outcome = init(&platform, &reporter, APP, None, &targets, Some(&wait(60)))
        .await
        .unwrap();

    assert!(outcome.application_created);
    assert_eq!(outcome.created, vec!["my-app-staging"]);
    assert_eq!(outcome.existing, vec!["my-app-prod"]);
    assert_eq!(
        platform.log(),
        vec!["create_application my-app", "create_environment my-app-staging -"]
    );
    assert_eq!(
        platform.find("my-app-staging").map(|e| e.status),
        Some(EnvironmentStatus::Ready)
    );
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn update_warns_on_validation_and_still_applies() {
    let config = config();
    let targets = config.environments(&[]).unwrap();
    let platform = MemoryPlatform::default()
        .with_application()
        .with_environment(ready("my-app-prod"))
        .with_lag(1);
    platform.validation.borrow_mut().push(ValidationMessage {
        message: "MaxSize exceeds account limit".to_string(),
        severity: Severity::Error,
        namespace: "aws:autoscaling:asg".to_string(),
        option_name: "MaxSize".to_string(),
    });
    let reporter = Transcript::default();

    let updated = update_environments(&platform, &reporter, APP, &targets, Some(&wait(60)))
        .await
        .unwrap();

    // staging is not live, so only prod is touched
    assert_eq!(updated, vec!["my-app-prod"]);
    assert_eq!(
        platform.log(),
        vec!["validate my-app-prod", "update_environment my-app-prod - settings=2"]
    );
    assert!(reporter.contains(
        "warn: [error] my-app-prod - 'aws:autoscaling:asg:MaxSize': MaxSize exceeds account limit"
    ));
    assert!(reporter.contains("warn: environment my-app-staging does not exist"));
    assert_eq!(
        platform.find("my-app-prod").map(|e| e.status),
        Some(EnvironmentStatus::Ready)
    );
}

#[tokio::test(start_paused = true)]
async fn rebuild_waits_until_ready_again() {
    let platform = MemoryPlatform::default()
        .with_application()
        .with_environment(ready("my-app-prod"))
        .with_lag(2);
    let names = vec!["my-app-prod".to_string()];
    let started = Instant::now();

    rebuild(&platform, &Transcript::default(), APP, &names, Some(&wait(60)))
        .await
        .unwrap();

    assert_eq!(platform.log(), vec!["rebuild_environment my-app-prod"]);
    assert_eq!(started.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn terminate_follows_environments_into_terminated() {
    let platform = MemoryPlatform::default()
        .with_application()
        .with_environment(ready("my-app-prod"))
        .with_environment(ready("my-app-staging"))
        .with_lag(0);
    let names = vec!["my-app-staging".to_string()];
    let reporter = Transcript::default();

    terminate(&platform, &reporter, APP, &names, Some(&wait(60)))
        .await
        .unwrap();

    assert_eq!(
        platform.find("my-app-staging").map(|e| e.status),
        Some(EnvironmentStatus::Terminated)
    );
    let live = list_environments(&platform, APP).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].environment_name, "my-app-prod");
    assert_eq!(reporter.count("... done"), 1);
}

#[tokio::test(start_paused = true)]
async fn waiting_on_a_vanished_environment_fails_fast() {
    let platform = MemoryPlatform::default().with_application();
    let names = vec!["my-app-gone".to_string()];
    let started = Instant::now();

    let err = rebuild(&platform, &Transcript::default(), APP, &names, Some(&wait(600)))
        .await
        .expect_err("not found");

    assert!(matches!(
        err.downcast_ref::<DeployError>(),
        Some(DeployError::EnvironmentsNotFound { names }) if names == &["my-app-gone".to_string()]
    ));
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn cleanup_spares_versions_still_deployed() {
    let platform = MemoryPlatform::default()
        .with_application()
        .with_environment(environment(
            "my-app-prod",
            EnvironmentStatus::Ready,
            EnvironmentHealth::Green,
            Some("v1"),
        ))
        .with_versions((1..=5).map(|n| version(&format!("v{n}"), day(n))).collect());

    let deleted = delete_unused_versions(&platform, &Transcript::default(), APP, 2)
        .await
        .unwrap();

    assert_eq!(deleted, vec!["v3", "v2"]);
    assert_eq!(platform.version_labels(), vec!["v1", "v4", "v5"]);
}

#[tokio::test]
async fn delete_application_terminates_everything() {
    let platform = MemoryPlatform::default()
        .with_application()
        .with_environment(ready("my-app-prod"));

    delete_application(&platform, &Transcript::default(), APP)
        .await
        .unwrap();

    assert!(platform.applications.borrow().is_empty());
    assert!(list_environments(&platform, APP).await.unwrap().is_empty());
}
