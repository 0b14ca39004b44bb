//! `ebdeploy delete-application` — delete the application and all its environments.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::environments::delete_application;

/// Run `ebdeploy delete-application`.
///
/// # Errors
///
/// Returns an error if the config is invalid, the prompt fails, or the
/// platform call fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let session = app.session()?;
    let application = session.application();

    if !app.output.quiet {
        println!();
        println!("This will permanently delete application {application},");
        println!("terminating every environment that belongs to it.");
        println!();
    }
    // --yes / CI count as consent.
    if !app.non_interactive && !app.confirm("Continue?", false)? {
        app.output.info("Cancelled.");
        return Ok(());
    }

    delete_application(&session.aws, &app.reporter(), application).await?;
    app.renderer()
        .render_names("deleted", "Deleted application", &[application.to_string()])
}
