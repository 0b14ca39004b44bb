//! Command implementations

pub mod cleanup;
pub mod delete;
pub mod delete_application;
pub mod deploy;
pub mod environments;
pub mod init;
pub mod rebuild;
pub mod stacks;
pub mod update;
pub mod version;
pub mod wait;

use clap::Args;

use crate::domain::DeployConfig;

/// Environment selection shared by commands that act on configured environments.
#[derive(Args, Debug, Clone, Default)]
pub struct EnvironmentArgs {
    /// Environment to act on (repeatable; default: every configured environment)
    #[arg(short, long = "environment", value_name = "NAME")]
    pub environments: Vec<String>,
}

impl EnvironmentArgs {
    /// Resolve the selected environment names against the config.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected name is not defined in the config.
    pub fn names(&self, config: &DeployConfig) -> anyhow::Result<Vec<String>> {
        Ok(config
            .environments(&self.environments)?
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect())
    }
}
