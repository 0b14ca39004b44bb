//! Application and environment lifecycle use-cases.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use ebdeploy_common::{EnvironmentDescription, EnvironmentStatus, OptionSetting, Severity};

use crate::application::ports::{
    ApplicationApi, CreateEnvironment, EnvironmentApi, EnvironmentQuery, PlatformApi,
    ProgressReporter, UpdateEnvironment,
};
use crate::application::services::convergence::wait_for_environments;
use crate::domain::{EnvironmentConfig, TargetCriteria, WaitOptions, WatchSet};

/// A configured environment selected for a run.
pub type EnvironmentTarget<'a> = (&'a str, &'a EnvironmentConfig);

/// Check whether the application is registered.
///
/// # Errors
///
/// Returns an error if the platform call fails.
pub async fn application_exists(platform: &impl ApplicationApi, application: &str) -> Result<bool> {
    let found = platform
        .describe_applications(&[application.to_string()])
        .await
        .with_context(|| format!("describing application {application}"))?;
    Ok(!found.is_empty())
}

/// Check whether a live (not terminated) environment with this name exists.
///
/// # Errors
///
/// Returns an error if the platform call fails.
pub async fn environment_exists(
    platform: &impl EnvironmentApi,
    application: &str,
    environment: &str,
) -> Result<bool> {
    let names = [environment.to_string()];
    let found = platform
        .describe_environments(&EnvironmentQuery {
            application,
            names: Some(&names),
            include_deleted: false,
        })
        .await
        .with_context(|| format!("describing environment {environment}"))?;
    Ok(found
        .first()
        .is_some_and(|e| e.status != EnvironmentStatus::Terminated))
}

/// Every environment of the application, terminated ones excluded.
///
/// # Errors
///
/// Returns an error if the platform call fails.
pub async fn list_environments(
    platform: &impl EnvironmentApi,
    application: &str,
) -> Result<Vec<EnvironmentDescription>> {
    platform
        .describe_environments(&EnvironmentQuery {
            application,
            names: None,
            include_deleted: false,
        })
        .await
        .context("listing environments")
}

/// Create the application unless it already exists. Returns `true` if created.
///
/// # Errors
///
/// Returns an error if a platform call fails.
pub async fn ensure_application(
    platform: &impl ApplicationApi,
    reporter: &impl ProgressReporter,
    application: &str,
    description: Option<&str>,
) -> Result<bool> {
    if application_exists(platform, application).await? {
        tracing::debug!(application, "application already exists");
        return Ok(false);
    }
    reporter.step(&format!("creating application {application}..."));
    platform
        .create_application(application, description)
        .await
        .with_context(|| format!("creating application {application}"))?;
    reporter.success(&format!("created application {application}"));
    Ok(true)
}

/// Launch a configured environment, optionally running `version_label`.
///
/// # Errors
///
/// Returns an error if the option settings are malformed or the call fails.
pub async fn create_environment(
    platform: &impl EnvironmentApi,
    reporter: &impl ProgressReporter,
    application: &str,
    (name, config): EnvironmentTarget<'_>,
    version_label: Option<&str>,
) -> Result<()> {
    let option_settings = config.option_settings()?;
    reporter.step(&format!("creating environment {name}..."));
    platform
        .create_environment(&CreateEnvironment {
            application,
            environment: name,
            version_label,
            solution_stack: config.solution_stack_name.as_deref(),
            cname_prefix: config.cname_prefix.as_deref(),
            description: config.description.as_deref(),
            option_settings: &option_settings,
        })
        .await
        .with_context(|| format!("creating environment {name}"))?;
    reporter.success(&format!("environment {name} is launching"));
    Ok(())
}

/// Validate option settings, report every message, then update regardless.
///
/// Error-severity messages are reported but do not block the update.
///
/// # Errors
///
/// Returns an error if validation or the update call itself fails.
pub async fn update_environment(
    platform: &impl EnvironmentApi,
    reporter: &impl ProgressReporter,
    application: &str,
    request: &UpdateEnvironment<'_>,
) -> Result<()> {
    let name = request.environment;
    if !request.option_settings.is_empty() {
        let messages = platform
            .validate_configuration_settings(application, name, request.option_settings)
            .await
            .with_context(|| format!("validating settings for {name}"))?;
        for m in &messages {
            let line = format!(
                "[{}] {name} - '{}:{}': {}",
                m.severity, m.namespace, m.option_name, m.message
            );
            match m.severity {
                Severity::Error | Severity::Warning => reporter.warn(&line),
                Severity::Info | Severity::Unknown => reporter.step(&line),
            }
        }
    }
    reporter.step(&format!("updating environment {name}..."));
    platform
        .update_environment(request)
        .await
        .with_context(|| format!("updating environment {name}"))
}

/// Apply each selected environment's description and option settings.
///
/// Environments that do not exist yet are skipped with a warning. Returns the
/// updated names.
///
/// # Errors
///
/// Returns the first validation, update, or wait error.
pub async fn update_environments(
    platform: &impl PlatformApi,
    reporter: &impl ProgressReporter,
    application: &str,
    targets: &[EnvironmentTarget<'_>],
    wait: Option<&WaitOptions>,
) -> Result<Vec<String>> {
    let mut updated = Vec::new();
    for &(name, config) in targets {
        if !environment_exists(platform, application, name).await? {
            reporter.warn(&format!(
                "environment {name} does not exist, run 'ebdeploy init' to create it"
            ));
            continue;
        }
        let option_settings: Vec<OptionSetting> = config.option_settings()?;
        update_environment(
            platform,
            reporter,
            application,
            &UpdateEnvironment {
                environment: name,
                version_label: None,
                description: config.description.as_deref(),
                option_settings: &option_settings,
            },
        )
        .await?;
        updated.push(name.to_string());
    }
    if let Some(options) = wait {
        wait_for_environments(
            platform,
            reporter,
            application,
            updated.iter().cloned().collect(),
            &TargetCriteria::status(EnvironmentStatus::Ready),
            options,
        )
        .await?;
    }
    Ok(updated)
}

/// What `init` found and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOutcome {
    pub application_created: bool,
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Create the application and every missing environment, without a version.
///
/// # Errors
///
/// Returns the first platform or wait error.
pub async fn init(
    platform: &impl PlatformApi,
    reporter: &impl ProgressReporter,
    application: &str,
    description: Option<&str>,
    targets: &[EnvironmentTarget<'_>],
    wait: Option<&WaitOptions>,
) -> Result<InitOutcome> {
    let mut outcome = InitOutcome {
        application_created: ensure_application(platform, reporter, application, description)
            .await?,
        ..InitOutcome::default()
    };
    for &target in targets {
        let name = target.0;
        if environment_exists(platform, application, name).await? {
            reporter.step(&format!("environment {name} already exists"));
            outcome.existing.push(name.to_string());
            continue;
        }
        create_environment(platform, reporter, application, target, None).await?;
        outcome.created.push(name.to_string());
    }
    if let Some(options) = wait {
        let watch: WatchSet = targets.iter().map(|&(name, _)| name).collect();
        wait_for_environments(
            platform,
            reporter,
            application,
            watch,
            &TargetCriteria::status(EnvironmentStatus::Ready),
            options,
        )
        .await?;
    }
    Ok(outcome)
}

/// Rebuild the named environments.
///
/// # Errors
///
/// Returns the first platform or wait error.
pub async fn rebuild(
    platform: &impl EnvironmentApi,
    reporter: &impl ProgressReporter,
    application: &str,
    names: &[String],
    wait: Option<&WaitOptions>,
) -> Result<()> {
    for name in names {
        reporter.step(&format!("rebuilding environment {name}..."));
        platform
            .rebuild_environment(name)
            .await
            .with_context(|| format!("rebuilding environment {name}"))?;
    }
    if let Some(options) = wait {
        wait_for_environments(
            platform,
            reporter,
            application,
            names.iter().cloned().collect(),
            &TargetCriteria::status(EnvironmentStatus::Ready),
            options,
        )
        .await?;
    }
    Ok(())
}

/// Terminate the named environments and wait for them to be gone.
///
/// The wait always includes deleted environments, whatever `wait` says.
///
/// # Errors
///
/// Returns the first platform or wait error.
pub async fn terminate(
    platform: &impl EnvironmentApi,
    reporter: &impl ProgressReporter,
    application: &str,
    names: &[String],
    wait: Option<&WaitOptions>,
) -> Result<()> {
    for name in names {
        reporter.step(&format!("terminating environment {name}..."));
        platform
            .terminate_environment(name)
            .await
            .with_context(|| format!("terminating environment {name}"))?;
    }
    if let Some(options) = wait {
        let options = WaitOptions {
            include_deleted: true,
            ..*options
        };
        wait_for_environments(
            platform,
            reporter,
            application,
            names.iter().cloned().collect(),
            &TargetCriteria::status(EnvironmentStatus::Terminated),
            &options,
        )
        .await?;
    }
    Ok(())
}

/// Delete the application, terminating its environments.
///
/// # Errors
///
/// Returns an error if the platform call fails.
pub async fn delete_application(
    platform: &impl ApplicationApi,
    reporter: &impl ProgressReporter,
    application: &str,
) -> Result<()> {
    reporter.step(&format!("deleting application {application}..."));
    platform
        .delete_application(application)
        .await
        .with_context(|| format!("deleting application {application}"))?;
    reporter.success(&format!("deleted application {application}"));
    Ok(())
}
