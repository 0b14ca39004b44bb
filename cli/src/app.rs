//! Application context — unified state passed to every command handler.
//!
//! `AppContext` is built once from the global flags. Commands that talk to the
//! platform open a `Session`, which loads and validates the config file and
//! builds the `aws` adapter with the resolved credentials.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::{AwsCredentials, DeployConfig, WaitOptions, validate_config};
use crate::infra::aws_cli::AwsCli;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by the `CI` env var).
    pub yes: bool,
    /// Path of the deployment config file.
    pub config: PathBuf,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Deployment config file.
    pub config_store: YamlConfigStore,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` environment
    /// variable is present.
    pub non_interactive: bool,
}

/// Everything a platform-facing command needs, built from the config file.
pub struct Session {
    pub config: DeployConfig,
    pub credentials: AwsCredentials,
    pub aws: AwsCli<TokioCommandRunner>,
}

impl Session {
    /// Application name from the config.
    #[must_use]
    pub fn application(&self) -> &str {
        &self.config.app.app_name
    }
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let non_interactive = flags.behaviour.yes || std::env::var("CI").is_ok();

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // Progress lines would corrupt the JSON document on stdout.
        let quiet = flags.output.quiet || flags.output.json;

        Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config_store: YamlConfigStore::new(flags.behaviour.config.clone()),
            non_interactive,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter bound to this context's output settings.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Load and validate the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_config(&self) -> Result<DeployConfig> {
        let config = self.config_store.load()?;
        validate_config(&config)
            .with_context(|| format!("invalid config {}", self.config_store.path().display()))?;
        tracing::debug!(path = %self.config_store.path().display(), "config loaded");
        Ok(config)
    }

    /// Load the config and resolve credentials into a platform session.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or credentials are missing.
    pub fn session(&self) -> Result<Session> {
        let config = self.load_config()?;
        let credentials = AwsCredentials::resolve(&config.aws, |var| std::env::var(var).ok())
            .with_context(|| format!("invalid config {}", self.config_store.path().display()))?;
        tracing::debug!(?credentials, "credentials resolved");
        let aws = AwsCli::from_credentials(&credentials);
        Ok(Session {
            config,
            credentials,
            aws,
        })
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI or `--yes` flag), returns
    /// `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}

/// Shared `--timeout` / `--no-wait` flags.
#[derive(Debug, Clone, clap::Args)]
pub struct WaitArgs {
    /// Seconds to wait for environments to converge
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub timeout: u64,

    /// Return without waiting for environments to converge
    #[arg(long)]
    pub no_wait: bool,
}

impl WaitArgs {
    /// Wait options, or `None` when `--no-wait` was given.
    #[must_use]
    pub fn options(&self) -> Option<WaitOptions> {
        (!self.no_wait)
            .then(|| WaitOptions::with_max_wait(std::time::Duration::from_secs(self.timeout)))
    }
}
