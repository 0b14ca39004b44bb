//! `ebdeploy list-solution-stacks`

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::ports::ApplicationApi;
use crate::output::progress;

/// Run `ebdeploy list-solution-stacks`.
///
/// # Errors
///
/// Returns an error if the config is invalid or the platform call fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let session = app.session()?;

    let pb = app
        .output
        .show_progress()
        .then(|| progress::spinner("Fetching solution stacks..."));
    let stacks = session
        .aws
        .list_available_solution_stacks()
        .await
        .context("listing solution stacks");
    if let Some(pb) = &pb {
        match &stacks {
            Ok(list) => progress::finish_ok(pb, &format!("{} solution stacks", list.len())),
            Err(_) => progress::finish_error(pb, "Failed to fetch solution stacks"),
        }
    }
    app.renderer().render_stacks(&stacks?)
}
