//! `ebdeploy wait-for` — block until environments reach a target state.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use ebdeploy_common::{EnvironmentHealth, EnvironmentStatus};

use crate::app::AppContext;
use crate::application::services::convergence::wait_for_environments;
use crate::commands::EnvironmentArgs;
use crate::domain::{TargetCriteria, WaitOptions};

/// Arguments for the wait-for command.
#[derive(Args, Debug, Clone)]
pub struct WaitForArgs {
    #[command(flatten)]
    pub environments: EnvironmentArgs,

    /// Required health
    #[arg(long, value_enum)]
    pub health: Option<EnvironmentHealth>,

    /// Required status (defaults to ready when no other criterion is given)
    #[arg(long, value_enum)]
    pub status: Option<EnvironmentStatus>,

    /// Required deployed version label
    #[arg(long, value_name = "LABEL")]
    pub version_label: Option<String>,

    /// Seconds to wait before giving up
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub timeout: u64,

    /// Ignore terminated environments when polling
    #[arg(long)]
    pub exclude_deleted: bool,
}

impl WaitForArgs {
    fn criteria(&self) -> TargetCriteria {
        let unconstrained =
            self.health.is_none() && self.status.is_none() && self.version_label.is_none();
        TargetCriteria {
            health: self.health,
            status: if unconstrained {
                Some(EnvironmentStatus::Ready)
            } else {
                self.status
            },
            version_label: self.version_label.clone(),
        }
    }

    fn options(&self) -> WaitOptions {
        WaitOptions {
            include_deleted: !self.exclude_deleted,
            ..WaitOptions::with_max_wait(Duration::from_secs(self.timeout))
        }
    }
}

/// Run `ebdeploy wait-for`.
///
/// # Errors
///
/// Returns an error if the config is invalid, an environment disappears, or
/// the wait times out.
pub async fn run(app: &AppContext, args: &WaitForArgs) -> Result<()> {
    let session = app.session()?;
    let names = args.environments.names(&session.config)?;

    wait_for_environments(
        &session.aws,
        &app.reporter(),
        session.application(),
        names.iter().cloned().collect(),
        &args.criteria(),
        &args.options(),
    )
    .await?;
    app.renderer()
        .render_names("converged", "Environments converged", &names)
}
