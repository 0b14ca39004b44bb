//! `ebdeploy init` — create the application and any missing environments.

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, WaitArgs};
use crate::application::services::environments::init;
use crate::commands::EnvironmentArgs;

/// Arguments for the init command.
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[command(flatten)]
    pub environments: EnvironmentArgs,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Run `ebdeploy init`.
///
/// # Errors
///
/// Returns an error if the config is invalid or a platform call fails.
pub async fn run(app: &AppContext, args: &InitArgs) -> Result<()> {
    let session = app.session()?;
    let application = session.application();
    let targets = session
        .config
        .environments(&args.environments.environments)?;

    let outcome = init(
        &session.aws,
        &app.reporter(),
        application,
        session.config.app.description.as_deref(),
        &targets,
        args.wait.options().as_ref(),
    )
    .await?;
    app.renderer().render_init(application, &outcome)
}
