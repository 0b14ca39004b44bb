//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared types crate —
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use ebdeploy_common::{
    ApplicationDescription, ApplicationVersion, EnvironmentDescription, OptionSetting,
    ValidationMessage,
};

use crate::domain::DeployConfig;
use crate::domain::archive::{ArchiveRules, SyntheticEntry};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Filter for describe-environment calls.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentQuery<'a> {
    pub application: &'a str,
    /// Restrict the result to these names. `None` returns every environment.
    pub names: Option<&'a [String]>,
    /// Also return environments that were terminated recently.
    pub include_deleted: bool,
}

/// Parameters for creating an environment.
#[derive(Debug, Clone, Copy)]
pub struct CreateEnvironment<'a> {
    pub application: &'a str,
    pub environment: &'a str,
    pub version_label: Option<&'a str>,
    pub solution_stack: Option<&'a str>,
    pub cname_prefix: Option<&'a str>,
    pub description: Option<&'a str>,
    pub option_settings: &'a [OptionSetting],
}

/// Parameters for updating an environment. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateEnvironment<'a> {
    pub environment: &'a str,
    pub version_label: Option<&'a str>,
    pub description: Option<&'a str>,
    pub option_settings: &'a [OptionSetting],
}

/// Parameters for registering an application version.
#[derive(Debug, Clone, Copy)]
pub struct NewVersion<'a> {
    pub application: &'a str,
    pub version_label: &'a str,
    pub bucket: &'a str,
    pub key: &'a str,
}

/// A local file to be stored as an object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectUpload<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub path: &'a Path,
    pub metadata: &'a [(String, String)],
}

/// What to put into an archive and where to write it.
#[derive(Debug)]
pub struct ArchiveRequest<'a> {
    pub root: &'a Path,
    pub output: &'a Path,
    pub rules: &'a ArchiveRules,
    pub entries: &'a [SyntheticEntry],
}

/// Result of a successful archive build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    /// Number of entries written, synthetic ones included.
    pub entries: usize,
    pub size: u64,
    /// Hex SHA-256 of the archive bytes.
    pub sha256: String,
}

// ── Platform Port Traits ──────────────────────────────────────────────────────

/// Application-level operations.
#[allow(async_fn_in_trait)]
pub trait ApplicationApi {
    /// Register a new application.
    async fn create_application(&self, name: &str, description: Option<&str>) -> Result<()>;
    /// Delete an application, terminating its environments.
    async fn delete_application(&self, name: &str) -> Result<()>;
    /// Describe the named applications; unknown names are simply absent.
    async fn describe_applications(&self, names: &[String]) -> Result<Vec<ApplicationDescription>>;
    /// List the solution stacks environments can be launched on.
    async fn list_available_solution_stacks(&self) -> Result<Vec<String>>;
}

/// Environment-level operations.
#[allow(async_fn_in_trait)]
pub trait EnvironmentApi {
    async fn create_environment(&self, request: &CreateEnvironment<'_>) -> Result<()>;
    async fn update_environment(&self, request: &UpdateEnvironment<'_>) -> Result<()>;
    async fn rebuild_environment(&self, environment: &str) -> Result<()>;
    /// Terminate an environment together with its resources.
    async fn terminate_environment(&self, environment: &str) -> Result<()>;
    async fn describe_environments(
        &self,
        query: &EnvironmentQuery<'_>,
    ) -> Result<Vec<EnvironmentDescription>>;
    /// Check option settings without applying them.
    async fn validate_configuration_settings(
        &self,
        application: &str,
        environment: &str,
        option_settings: &[OptionSetting],
    ) -> Result<Vec<ValidationMessage>>;
}

/// Application version operations.
#[allow(async_fn_in_trait)]
pub trait VersionApi {
    async fn create_application_version(&self, version: &NewVersion<'_>) -> Result<()>;
    async fn describe_application_versions(&self, application: &str)
    -> Result<Vec<ApplicationVersion>>;
    async fn delete_application_version(&self, application: &str, version_label: &str)
    -> Result<()>;
}

/// Composite trait — any type implementing all three sub-traits is a `PlatformApi`.
pub trait PlatformApi: ApplicationApi + EnvironmentApi + VersionApi {}

/// Blanket implementation: any type implementing all three sub-traits is a `PlatformApi`.
impl<T> PlatformApi for T where T: ApplicationApi + EnvironmentApi + VersionApi {}

// ── Storage Port ──────────────────────────────────────────────────────────────

/// Object storage operations.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Region the bucket lives in, or `None` if the bucket does not exist.
    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>>;
    /// Create a bucket in an explicit region.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;
    /// Stream a file into an object. `progress` receives `(sent, total)`
    /// a bounded number of times.
    async fn put_object(&self, upload: &ObjectUpload<'_>, progress: &dyn Fn(u64, u64))
    -> Result<()>;
}

// ── Archive Port ──────────────────────────────────────────────────────────────

/// Builds the source bundle on the local filesystem.
pub trait ArchiveBuilder {
    /// Write the archive described by `request`.
    ///
    /// On error the output file must be treated as invalid.
    fn build(
        &self,
        request: &ArchiveRequest<'_>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ArchiveSummary>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading of the deployment config file.
pub trait ConfigStore {
    /// Load and parse the config file.
    fn load(&self) -> Result<DeployConfig>;
    /// Location of the config file.
    fn path(&self) -> &Path;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Spawn a program with piped stdin, stdout, and stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn spawn(&self, program: &str, args: &[&str]) -> Result<tokio::process::Child>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Report bytes transferred so far out of `total`.
    fn transfer(&self, sent: u64, total: u64);
}
