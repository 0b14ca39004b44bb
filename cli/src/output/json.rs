//! JSON output helpers.
//!
//! Provides the machine-readable renderer and the error-object formatter used
//! by all `--json` code paths when a command fails.

use anyhow::{Context, Result};
use ebdeploy_common::EnvironmentDescription;
use serde::Serialize;

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::environments::InitOutcome;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen in
/// practice — `serde_json` only fails on non-finite floats and maps with
/// non-string keys, neither of which appear here).
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Renders command results as pretty-printed JSON on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &impl Serialize) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{text}");
        Ok(())
    }

    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        Self::print(&serde_json::json!({ "version": version }))
    }

    /// Render environment descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_environments(environments: &[EnvironmentDescription]) -> Result<()> {
        Self::print(&serde_json::json!({ "environments": environments }))
    }

    /// Render solution stack names.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_stacks(stacks: &[String]) -> Result<()> {
        Self::print(&serde_json::json!({ "solution_stacks": stacks }))
    }

    /// Render the result of a deploy.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_deploy(outcome: &DeployOutcome) -> Result<()> {
        Self::print(&deploy_value(outcome))
    }

    /// Render the result of `init`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_init(application: &str, outcome: &InitOutcome) -> Result<()> {
        Self::print(&serde_json::json!({
            "application": application,
            "application_created": outcome.application_created,
            "created": outcome.created,
            "existing": outcome.existing,
        }))
    }

    /// Render a list of affected environment or version names.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_names(key: &str, names: &[String]) -> Result<()> {
        let mut obj = serde_json::Map::new();
        obj.insert(key.to_string(), serde_json::json!(names));
        Self::print(&serde_json::Value::Object(obj))
    }
}

/// JSON view of a deploy outcome.
#[must_use]
pub fn deploy_value(outcome: &DeployOutcome) -> serde_json::Value {
    serde_json::json!({
        "version_label": outcome.version_label,
        "object_key": outcome.object_key,
        "archive": {
            "entries": outcome.archive.entries,
            "size": outcome.archive.size,
            "sha256": outcome.archive.sha256,
        },
        "created": outcome.created,
        "updated": outcome.updated,
        "waited": outcome.waited,
        "deleted_versions": outcome.deleted_versions,
    })
}
