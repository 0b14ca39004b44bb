//! Human-readable terminal renderer.

use ebdeploy_common::EnvironmentDescription;
use owo_colors::OwoColorize as _;

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::environments::InitOutcome;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if !self.ctx.quiet {
            println!("ebdeploy {version}");
        }
    }

    /// Render environments as an aligned table.
    pub fn render_environments(&self, environments: &[EnvironmentDescription]) {
        if environments.is_empty() {
            self.ctx.info("No environments found. Create them with: ebdeploy init");
            return;
        }
        let width = environments
            .iter()
            .map(|e| e.environment_name.len())
            .max()
            .unwrap_or(0)
            .max("NAME".len());
        println!(
            "  {}",
            format!(
                "{:<width$}  {:<11}  {:<7}  {:<24}  CNAME",
                "NAME", "STATUS", "HEALTH", "VERSION"
            )
            .style(self.ctx.styles.bold)
        );
        for env in environments {
            println!("  {}", environment_row(env, width, self.ctx));
        }
    }

    /// Render available solution stacks, one per line.
    pub fn render_stacks(&self, stacks: &[String]) {
        for stack in stacks {
            println!("{stack}");
        }
    }

    /// Render the result of a deploy.
    pub fn render_deploy(&self, outcome: &DeployOutcome) {
        if !self.ctx.quiet {
            println!();
        }
        self.ctx.success(&format!("Deployed {}", outcome.version_label));
        self.ctx.kv("Object:", &outcome.object_key);
        self.ctx.kv("SHA-256:", &outcome.archive.sha256);
        if !outcome.created.is_empty() {
            self.ctx.kv("Created:", &outcome.created.join(", "));
        }
        if !outcome.updated.is_empty() {
            self.ctx.kv("Updated:", &outcome.updated.join(", "));
        }
        if !outcome.deleted_versions.is_empty() {
            self.ctx.kv(
                "Cleaned up:",
                &format!("{} old version(s)", outcome.deleted_versions.len()),
            );
        }
        if !outcome.waited {
            self.ctx
                .info("Not waiting for environments. Check progress with: ebdeploy environments");
        }
    }

    /// Render the result of `init`.
    pub fn render_init(&self, application: &str, outcome: &InitOutcome) {
        if !self.ctx.quiet {
            println!();
        }
        self.ctx.header(application);
        if outcome.application_created {
            self.ctx.success(&format!("Application {application} created"));
        }
        for name in &outcome.created {
            self.ctx.success(&format!("Environment {name} created"));
        }
        for name in &outcome.existing {
            self.ctx.info(&format!("Environment {name} already existed"));
        }
    }

    /// Render a one-line summary followed by the affected names.
    pub fn render_names(&self, summary: &str, names: &[String]) {
        if names.is_empty() {
            self.ctx.info(&format!("{summary}: none"));
        } else {
            self.ctx.success(&format!("{summary}: {}", names.join(", ")));
        }
    }
}

fn environment_row(env: &EnvironmentDescription, width: usize, ctx: &OutputContext) -> String {
    let health = format!("{:<7}", env.health.as_str());
    format!(
        "{:<width$}  {:<11}  {}  {:<24}  {}",
        env.environment_name,
        env.status.as_str(),
        health.style(ctx.styles.health(env.health)),
        env.version_label.as_deref().unwrap_or("-"),
        env.cname.as_deref().unwrap_or("-"),
    )
}
