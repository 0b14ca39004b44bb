//! `ebdeploy list-environments` — show the application's environments.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::environments::list_environments;

/// Run `ebdeploy list-environments`.
///
/// # Errors
///
/// Returns an error if the config is invalid or the platform call fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let session = app.session()?;
    let environments = list_environments(&session.aws, session.application()).await?;
    app.renderer().render_environments(&environments)
}
