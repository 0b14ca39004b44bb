//! `ebdeploy update-environments` — push configured settings to live environments.

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, WaitArgs};
use crate::application::services::environments::update_environments;
use crate::commands::EnvironmentArgs;

/// Arguments for the update-environments command.
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub environments: EnvironmentArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Run `ebdeploy update-environments`.
///
/// # Errors
///
/// Returns an error if the config is invalid or a platform call fails.
pub async fn run(app: &AppContext, args: &UpdateArgs) -> Result<()> {
    let session = app.session()?;
    let targets = session
        .config
        .environments(&args.environments.environments)?;

    let updated = update_environments(
        &session.aws,
        &app.reporter(),
        session.application(),
        &targets,
        args.wait.options().as_ref(),
    )
    .await?;
    app.renderer()
        .render_names("updated", "Updated environments", &updated)
}
