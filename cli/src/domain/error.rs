//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Deployment errors ─────────────────────────────────────────────────────────

/// Errors raised while packaging, uploading, or rolling out a version.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(
        "Bucket '{bucket}' exists in region '{actual}' but '{requested}' was requested. \
         Use a different bucket name or change the configured region."
    )]
    BucketRegionMismatch {
        bucket: String,
        actual: String,
        requested: String,
    },

    #[error("Couldn't find any environments matching: {}", .names.join(", "))]
    EnvironmentsNotFound { names: Vec<String> },

    #[error(
        "Timed out after {waited_secs}s waiting for environment(s): {}",
        .pending.join(" and ")
    )]
    WaitTimeout {
        waited_secs: u64,
        pending: Vec<String>,
    },

    #[error("Environment '{0}' is not defined in the config file.")]
    UnknownEnvironment(String),

    #[error("Application '{0}' does not exist. Run 'ebdeploy init' first.")]
    ApplicationNotFound(String),
}

impl DeployError {
    /// Stable machine-readable code used in JSON error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BucketRegionMismatch { .. } => "bucket_region_mismatch",
            Self::EnvironmentsNotFound { .. } => "environments_not_found",
            Self::WaitTimeout { .. } => "wait_timeout",
            Self::UnknownEnvironment(_) => "unknown_environment",
            Self::ApplicationNotFound(_) => "application_not_found",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to the deployment config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid archive file entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },

    #[error("Invalid value for option '{namespace}:{option}': {reason}")]
    InvalidOption {
        namespace: String,
        option: String,
        reason: String,
    },
}
