//! Deploy use-case: archive, upload, register, roll out, wait, clean up.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::{
    ArchiveBuilder, ArchiveRequest, ArchiveSummary, NewVersion, ObjectStore, PlatformApi,
    ProgressReporter, UpdateEnvironment,
};
use crate::application::services::convergence::wait_for_environments;
use crate::application::services::environments::{
    EnvironmentTarget, create_environment, ensure_application, environment_exists,
    update_environment,
};
use crate::application::services::retention::delete_unused_versions;
use crate::application::services::storage::{ensure_bucket, upload_archive};
use crate::domain::version::archive_file_name;
use crate::domain::{AwsCredentials, TargetCriteria, WaitOptions, WatchSet};

/// Everything a deploy run needs besides its ports.
#[derive(Debug)]
pub struct DeployRequest<'a> {
    pub application: &'a str,
    pub description: Option<&'a str>,
    pub version_label: &'a str,
    pub archive: ArchiveRequest<'a>,
    pub targets: &'a [EnvironmentTarget<'a>],
    /// Convergence target. Normally `TargetCriteria::deployed(version_label)`.
    pub criteria: TargetCriteria,
    /// `None` skips waiting.
    pub wait: Option<WaitOptions>,
    /// `None` skips version cleanup.
    pub versions_to_keep: Option<usize>,
}

/// What a deploy run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub version_label: String,
    pub object_key: String,
    pub archive: ArchiveSummary,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub waited: bool,
    pub deleted_versions: Vec<String>,
}

/// Run a full deployment.
///
/// # Errors
///
/// Returns the first failing step's error. Nothing is uploaded when the
/// bucket check fails, and no environment is touched when the upload fails.
pub async fn deploy(
    platform: &impl PlatformApi,
    store: &impl ObjectStore,
    builder: &impl ArchiveBuilder,
    reporter: &impl ProgressReporter,
    credentials: &AwsCredentials,
    request: &DeployRequest<'_>,
) -> Result<DeployOutcome> {
    let application = request.application;
    let label = request.version_label;

    // 1. Package
    reporter.step(&format!("building archive {}...", request.archive.output.display()));
    let archive = builder
        .build(&request.archive, reporter)
        .context("building archive")?;
    reporter.success(&format!(
        "archived {} entries ({} bytes, sha256 {})",
        archive.entries, archive.size, archive.sha256
    ));

    // 2. Upload
    ensure_bucket(store, reporter, credentials).await?;
    let object_key =
        upload_archive(store, reporter, credentials, &archive, &archive_file_name(label)).await?;

    // 3. Register
    ensure_application(platform, reporter, application, request.description).await?;
    reporter.step(&format!("creating application version {label}..."));
    platform
        .create_application_version(&NewVersion {
            application,
            version_label: label,
            bucket: credentials.bucket(),
            key: &object_key,
        })
        .await
        .with_context(|| format!("creating application version {label}"))?;

    // 4. Roll out
    let mut created = Vec::new();
    let mut updated = Vec::new();
    for &target in request.targets {
        let name = target.0;
        if environment_exists(platform, application, name).await? {
            update_environment(
                platform,
                reporter,
                application,
                &UpdateEnvironment {
                    environment: name,
                    version_label: Some(label),
                    ..UpdateEnvironment::default()
                },
            )
            .await?;
            updated.push(name.to_string());
        } else {
            create_environment(platform, reporter, application, target, Some(label)).await?;
            created.push(name.to_string());
        }
    }

    // 5. Wait
    let waited = match &request.wait {
        Some(options) => {
            let watch: WatchSet = created.iter().chain(&updated).cloned().collect();
            wait_for_environments(
                platform,
                reporter,
                application,
                watch,
                &request.criteria,
                options,
            )
            .await?;
            true
        }
        None => false,
    };

    // 6. Clean up
    let deleted_versions = match request.versions_to_keep {
        Some(keep) => delete_unused_versions(platform, reporter, application, keep).await?,
        None => Vec::new(),
    };

    tracing::info!(
        version = label,
        created = created.len(),
        updated = updated.len(),
        "deploy finished"
    );
    Ok(DeployOutcome {
        version_label: label.to_string(),
        object_key,
        archive,
        created,
        updated,
        waited,
        deleted_versions,
    })
}
