//! `ebdeploy delete-environment` — terminate environments.

use anyhow::Result;
use clap::Args;

use crate::app::{AppContext, WaitArgs};
use crate::application::services::environments::terminate;

/// Arguments for the delete-environment command.
#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Environment to terminate (repeatable)
    #[arg(short, long = "environment", value_name = "NAME", required = true)]
    pub environments: Vec<String>,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Run `ebdeploy delete-environment`.
///
/// # Errors
///
/// Returns an error if the config is invalid or a platform call fails.
pub async fn run(app: &AppContext, args: &DeleteArgs) -> Result<()> {
    let session = app.session()?;
    let names: Vec<String> = session
        .config
        .environments(&args.environments)?
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    terminate(
        &session.aws,
        &app.reporter(),
        session.application(),
        &names,
        args.wait.options().as_ref(),
    )
    .await?;
    app.renderer()
        .render_names("terminated", "Terminated environments", &names)
}
