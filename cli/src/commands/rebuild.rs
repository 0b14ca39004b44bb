//! `ebdeploy rebuild` — rebuild environments from scratch.

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, WaitArgs};
use crate::application::services::environments::rebuild;
use crate::commands::EnvironmentArgs;

/// Arguments for the rebuild command.
#[derive(Args, Debug, Clone)]
pub struct RebuildArgs {
    #[command(flatten)]
    pub environments: EnvironmentArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Run `ebdeploy rebuild`.
///
/// # Errors
///
/// Returns an error if the config is invalid or a platform call fails.
pub async fn run(app: &AppContext, args: &RebuildArgs) -> Result<()> {
    let session = app.session()?;
    let names = args.environments.names(&session.config)?;

    rebuild(
        &session.aws,
        &app.reporter(),
        session.application(),
        &names,
        args.wait.options().as_ref(),
    )
    .await?;
    app.renderer()
        .render_names("rebuilt", "Rebuilt environments", &names)
}
