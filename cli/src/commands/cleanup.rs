//! `ebdeploy cleanup-versions` — prune old application versions.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::retention::delete_unused_versions;

/// Arguments for the cleanup-versions command.
#[derive(Args, Debug, Clone)]
pub struct CleanupArgs {
    /// Number of most recent versions to keep (default: app.versions_to_keep)
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,
}

/// Run `ebdeploy cleanup-versions`.
///
/// # Errors
///
/// Returns an error if the config is invalid or a platform call fails.
pub async fn run(app: &AppContext, args: &CleanupArgs) -> Result<()> {
    let session = app.session()?;
    let keep = args.keep.unwrap_or(session.config.app.versions_to_keep);
    tracing::info!(keep, "pruning application versions");

    let deleted =
        delete_unused_versions(&session.aws, &app.reporter(), session.application(), keep).await?;
    app.renderer()
        .render_names("deleted", "Deleted versions", &deleted)
}
