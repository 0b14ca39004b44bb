//! `ebdeploy deploy` — package, upload and roll out a new application version.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use ebdeploy_common::EnvironmentHealth;

use crate::app::{AppContext, WaitArgs};
use crate::application::ports::{ArchiveRequest, ConfigStore};
use crate::application::services::deploy::{DeployRequest, deploy};
use crate::commands::EnvironmentArgs;
use crate::domain::TargetCriteria;
use crate::domain::archive::archive_name;
use crate::domain::version::{archive_file_name, default_version_label};
use crate::infra::archive::ZipArchiveBuilder;

/// Arguments for the deploy command.
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Version label (default: <app>-<UTC timestamp>)
    #[arg(long, value_name = "LABEL")]
    pub version_label: Option<String>,

    #[command(flatten)]
    pub environments: EnvironmentArgs,

    /// Also require this health before the deploy counts as done
    #[arg(long, value_enum)]
    pub health: Option<EnvironmentHealth>,

    /// Keep old application versions instead of pruning them
    #[arg(long)]
    pub skip_cleanup: bool,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Run `ebdeploy deploy`.
///
/// # Errors
///
/// Returns an error if the config is invalid or any deploy step fails.
pub async fn run(app: &AppContext, args: &DeployArgs) -> Result<()> {
    let session = app.session()?;
    let config = &session.config;
    let targets = config.environments(&args.environments.environments)?;
    let entries = config.archive_entries()?;

    let label = args
        .version_label
        .clone()
        .unwrap_or_else(|| default_version_label(session.application(), Utc::now()));
    let config_path = app.config_store.path();
    let root = source_root(config_path, &config.app.archive.directory);
    let mut rules = config.archive_rules()?;
    if let Some(name) = config_entry(&root, config_path) {
        tracing::debug!(%name, "excluding config file from archive");
        rules = rules.exclude_when(move |entry| entry == name);
    }
    let staging = tempfile::tempdir().context("creating staging directory")?;
    let output = staging.path().join(archive_file_name(&label));

    let request = DeployRequest {
        application: session.application(),
        description: config.app.description.as_deref(),
        version_label: &label,
        archive: ArchiveRequest {
            root: &root,
            output: &output,
            rules: &rules,
            entries: &entries,
        },
        targets: &targets,
        criteria: TargetCriteria::deployed(&label).with_health(args.health),
        wait: args.wait.options(),
        versions_to_keep: (!args.skip_cleanup).then_some(config.app.versions_to_keep),
    };

    let reporter = app.reporter();
    let outcome = deploy(
        &session.aws,
        &session.aws,
        &ZipArchiveBuilder,
        &reporter,
        &session.credentials,
        &request,
    )
    .await?;
    app.renderer().render_deploy(&outcome)
}

/// Relative archive directories resolve against the config file's directory.
fn source_root(config_path: &Path, directory: &Path) -> PathBuf {
    if directory.is_absolute() {
        return directory.to_path_buf();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(directory)
}

/// Archive name of the config file when it lives inside the source tree.
fn config_entry(root: &Path, config_path: &Path) -> Option<String> {
    let root = std::fs::canonicalize(root).ok()?;
    let config_path = std::fs::canonicalize(config_path).ok()?;
    archive_name(&root, &config_path)
}
