//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::infra::config::DEFAULT_CONFIG_FILE;

/// Package, upload and roll out application bundles to managed environments
#[derive(Parser)]
#[command(
    name = "ebdeploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Deployment config file
    #[arg(
        short,
        long,
        global = true,
        env = "EBDEPLOY_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        value_name = "PATH"
    )]
    pub config: PathBuf,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log platform calls and decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Package, upload and roll out a new version
    Deploy(commands::deploy::DeployArgs),

    /// Create the application and any missing environments
    Init(commands::init::InitArgs),

    /// Apply configured settings to existing environments
    UpdateEnvironments(commands::update::UpdateArgs),

    /// Rebuild environments
    Rebuild(commands::rebuild::RebuildArgs),

    /// Terminate environments
    DeleteEnvironment(commands::delete::DeleteArgs),

    /// Delete the application and all of its environments
    DeleteApplication,

    /// List the application's environments
    #[command(visible_alias = "environments")]
    ListEnvironments,

    /// List available solution stacks
    #[command(visible_alias = "stacks")]
    ListSolutionStacks,

    /// Delete old application versions not used by any environment
    CleanupVersions(commands::cleanup::CleanupArgs),

    /// Wait until environments reach a target state
    WaitFor(commands::wait::WaitForArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Flags consumed by `AppContext::new`.
    #[must_use]
    pub fn app_flags(&self) -> AppFlags {
        AppFlags {
            output: OutputFlags {
                no_color: self.no_color,
                quiet: self.quiet,
                json: self.json,
            },
            behaviour: BehaviourFlags {
                yes: self.yes,
                config: self.config.clone(),
            },
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let app = AppContext::new(&self.app_flags());
        match self.command {
            Command::Deploy(args) => commands::deploy::run(&app, &args).await,
            Command::Init(args) => commands::init::run(&app, &args).await,
            Command::UpdateEnvironments(args) => commands::update::run(&app, &args).await,
            Command::Rebuild(args) => commands::rebuild::run(&app, &args).await,
            Command::DeleteEnvironment(args) => commands::delete::run(&app, &args).await,
            Command::DeleteApplication => commands::delete_application::run(&app).await,
            Command::ListEnvironments => commands::environments::run(&app).await,
            Command::ListSolutionStacks => commands::stacks::run(&app).await,
            Command::CleanupVersions(args) => commands::cleanup::run(&app, &args).await,
            Command::WaitFor(args) => commands::wait::run(&app, &args).await,
            Command::Version => commands::version::run(&app),
        }
    }
}
