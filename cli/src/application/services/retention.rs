//! Application version cleanup.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{EnvironmentApi, EnvironmentQuery, ProgressReporter, VersionApi};
use crate::domain::retention;

/// Pause after each deletion.
pub const DELETE_PAUSE: Duration = Duration::from_secs(2);

/// Delete versions beyond the newest `keep` that no live environment runs.
///
/// Returns the deleted labels, newest first.
///
/// # Errors
///
/// Returns the first platform error; versions deleted before it stay deleted.
pub async fn delete_unused_versions(
    platform: &(impl EnvironmentApi + VersionApi),
    reporter: &impl ProgressReporter,
    application: &str,
    keep: usize,
) -> Result<Vec<String>> {
    let versions = platform
        .describe_application_versions(application)
        .await
        .context("listing application versions")?;
    let environments = platform
        .describe_environments(&EnvironmentQuery {
            application,
            names: None,
            include_deleted: false,
        })
        .await
        .context("listing environments")?;
    let in_use: HashSet<String> = environments
        .into_iter()
        .filter_map(|e| e.version_label)
        .collect();

    let plan = retention::plan(&versions, &in_use, keep);
    for label in &plan.in_use {
        tracing::info!(version = %label, "keeping old version, still deployed");
    }
    if plan.delete.is_empty() {
        tracing::debug!(total = versions.len(), keep, "no versions to clean up");
        return Ok(Vec::new());
    }

    for label in &plan.delete {
        reporter.step(&format!("deleting version {label}..."));
        platform
            .delete_application_version(application, label)
            .await
            .with_context(|| format!("deleting version {label}"))?;
        tokio::time::sleep(DELETE_PAUSE).await;
    }
    reporter.success(&format!("deleted {} old version(s)", plan.delete.len()));
    Ok(plan.delete)
}
