//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod archive;
pub mod config;
pub mod convergence;
pub mod error;
pub mod retention;
pub mod version;

pub use config::{AwsCredentials, DeployConfig, EnvironmentConfig, validate_config};
pub use convergence::{TargetCriteria, WaitOptions, WatchSet};
pub use error::{ConfigError, DeployError};
