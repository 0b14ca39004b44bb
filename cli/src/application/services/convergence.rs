//! Convergence poller: waits until every watched environment matches a target.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use tokio::time::Instant;

use crate::application::ports::{EnvironmentApi, EnvironmentQuery, ProgressReporter};
use crate::domain::{DeployError, TargetCriteria, WaitOptions, WatchSet};

/// Poll the platform until every environment in `watch` satisfies `target`.
///
/// Each round sleeps `options.poll_interval`, then describes only the names
/// still pending. Converged names leave the set for good.
///
/// # Errors
///
/// - [`DeployError::EnvironmentsNotFound`] if a describe-call returns nothing.
/// - [`DeployError::WaitTimeout`] if names are still pending once
///   `options.max_wait` has elapsed at the end of a round.
/// - Any platform error, unchanged.
pub async fn wait_for_environments(
    platform: &impl EnvironmentApi,
    reporter: &impl ProgressReporter,
    application: &str,
    mut watch: WatchSet,
    target: &TargetCriteria,
    options: &WaitOptions,
) -> Result<()> {
    if watch.is_empty() {
        return Ok(());
    }
    reporter.step(&target.intent(&watch));

    let started = Instant::now();
    while !watch.is_empty() {
        tokio::time::sleep(options.poll_interval).await;

        let pending = watch.names();
        let query = EnvironmentQuery {
            application,
            names: Some(&pending),
            include_deleted: options.include_deleted,
        };
        let observed = platform
            .describe_environments(&query)
            .await
            .context("describing environments")?;
        if observed.is_empty() {
            return Err(DeployError::EnvironmentsNotFound { names: pending }.into());
        }

        for env in &observed {
            if !watch.contains(&env.environment_name) {
                tracing::debug!(
                    environment = %env.environment_name,
                    status = %env.status,
                    "ignoring descriptor for environment that already converged"
                );
                continue;
            }
            let line = target.observation(env);
            if target.is_satisfied_by(env) {
                reporter.success(&format!("{line} ... done"));
                watch.remove(&env.environment_name);
            } else {
                reporter.step(&format!("{line} ... waiting"));
            }
        }

        if !watch.is_empty() && started.elapsed() > options.max_wait {
            return Err(DeployError::WaitTimeout {
                waited_secs: options.max_wait.as_secs(),
                pending: watch.into_names(),
            }
            .into());
        }
    }
    Ok(())
}
