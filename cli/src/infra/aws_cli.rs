//! Infrastructure implementation of the platform and storage port traits.
//!
//! `AwsCli<R>` routes every call through a `CommandRunner` that invokes the
//! `aws` command-line client and parses its JSON output. Response envelopes
//! are private to this module; callers only see unwrapped lists.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};
use ebdeploy_common::{
    ApplicationDescription, ApplicationVersion, EnvironmentDescription, OptionSetting,
    ValidationMessage,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::application::ports::{
    ApplicationApi, CommandRunner, CreateEnvironment, EnvironmentApi, EnvironmentQuery,
    NewVersion, ObjectStore, ObjectUpload, UpdateEnvironment, VersionApi,
};
use crate::domain::AwsCredentials;
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner, UPLOAD_TIMEOUT};

const AWS: &str = "aws";

/// Region reported for buckets without a location constraint.
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

const UPLOAD_CHUNK: usize = 64 * 1024;

// ── Envelopes ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnvironmentsEnvelope {
    #[serde(default)]
    environments: Vec<EnvironmentDescription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApplicationsEnvelope {
    #[serde(default)]
    applications: Vec<ApplicationDescription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionsEnvelope {
    #[serde(default)]
    application_versions: Vec<ApplicationVersion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SolutionStacksEnvelope {
    #[serde(default)]
    solution_stacks: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ValidationEnvelope {
    #[serde(default)]
    messages: Vec<ValidationMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BucketLocation {
    #[serde(default)]
    location_constraint: Option<String>,
}

// ── Adapter ───────────────────────────────────────────────────────────────────

/// Adapter that drives the `aws` client through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
#[derive(Debug)]
pub struct AwsCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> AwsCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run `aws <service> <operation> <args…> --output json` and return stdout.
    async fn call(&self, service: &str, operation: &str, args: &[&str]) -> Result<Vec<u8>> {
        let mut full = vec![service, operation];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--output", "json"]);
        let output = self
            .runner
            .run(AWS, &full)
            .await
            .with_context(|| format!("aws {service} {operation}"))?;
        check(&output, service, operation)?;
        Ok(output.stdout)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        args: &[&str],
    ) -> Result<T> {
        let stdout = self.call(service, operation, args).await?;
        serde_json::from_slice(&stdout)
            .with_context(|| format!("parsing output of aws {service} {operation}"))
    }

    async fn beanstalk(&self, operation: &str, args: &[&str]) -> Result<()> {
        self.call("elasticbeanstalk", operation, args).await.map(drop)
    }
}

impl AwsCli<TokioCommandRunner> {
    /// Production adapter with credentials passed through the environment.
    #[must_use]
    pub fn from_credentials(credentials: &AwsCredentials) -> Self {
        let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT)
            .with_env("AWS_ACCESS_KEY_ID", credentials.access_key())
            .with_env("AWS_SECRET_ACCESS_KEY", credentials.secret_key())
            .with_env("AWS_DEFAULT_REGION", credentials.region())
            .with_env("AWS_PAGER", "");
        Self::new(runner)
    }
}

fn check(output: &Output, service: &str, operation: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("aws {service} {operation} failed: {}", stderr.trim())
}

fn option_settings_json(settings: &[OptionSetting]) -> Result<String> {
    serde_json::to_string(settings).context("serializing option settings")
}

fn is_missing_bucket(stderr: &str) -> bool {
    stderr.contains("NoSuchBucket") || stderr.contains("Not Found") || stderr.contains("404")
}

fn normalize_region(constraint: Option<String>) -> String {
    match constraint.as_deref() {
        None | Some("") => DEFAULT_BUCKET_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

fn metadata_arg(metadata: &[(String, String)]) -> String {
    metadata
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

// ── Platform ports ────────────────────────────────────────────────────────────

impl<R: CommandRunner> ApplicationApi for AwsCli<R> {
    async fn create_application(&self, name: &str, description: Option<&str>) -> Result<()> {
        let mut args = vec!["--application-name", name];
        if let Some(d) = description {
            args.extend(["--description", d]);
        }
        self.beanstalk("create-application", &args).await
    }

    async fn delete_application(&self, name: &str) -> Result<()> {
        self.beanstalk(
            "delete-application",
            &["--application-name", name, "--terminate-env-by-force"],
        )
        .await
    }

    async fn describe_applications(&self, names: &[String]) -> Result<Vec<ApplicationDescription>> {
        let mut args = vec!["--application-names"];
        args.extend(names.iter().map(String::as_str));
        let envelope: ApplicationsEnvelope = self
            .query("elasticbeanstalk", "describe-applications", &args)
            .await?;
        Ok(envelope.applications)
    }

    async fn list_available_solution_stacks(&self) -> Result<Vec<String>> {
        let envelope: SolutionStacksEnvelope = self
            .query("elasticbeanstalk", "list-available-solution-stacks", &[])
            .await?;
        Ok(envelope.solution_stacks)
    }
}

impl<R: CommandRunner> EnvironmentApi for AwsCli<R> {
    async fn create_environment(&self, request: &CreateEnvironment<'_>) -> Result<()> {
        let settings = option_settings_json(request.option_settings)?;
        let mut args = vec![
            "--application-name",
            request.application,
            "--environment-name",
            request.environment,
        ];
        let optional = [
            ("--version-label", request.version_label),
            ("--solution-stack-name", request.solution_stack),
            ("--cname-prefix", request.cname_prefix),
            ("--description", request.description),
        ];
        for (flag, value) in optional {
            if let Some(v) = value {
                args.extend([flag, v]);
            }
        }
        if !request.option_settings.is_empty() {
            args.extend(["--option-settings", settings.as_str()]);
        }
        self.beanstalk("create-environment", &args).await
    }

    async fn update_environment(&self, request: &UpdateEnvironment<'_>) -> Result<()> {
        let settings = option_settings_json(request.option_settings)?;
        let mut args = vec!["--environment-name", request.environment];
        if let Some(v) = request.version_label {
            args.extend(["--version-label", v]);
        }
        if let Some(d) = request.description {
            args.extend(["--description", d]);
        }
        if !request.option_settings.is_empty() {
            args.extend(["--option-settings", settings.as_str()]);
        }
        self.beanstalk("update-environment", &args).await
    }

    async fn rebuild_environment(&self, environment: &str) -> Result<()> {
        self.beanstalk("rebuild-environment", &["--environment-name", environment])
            .await
    }

    async fn terminate_environment(&self, environment: &str) -> Result<()> {
        self.beanstalk(
            "terminate-environment",
            &["--environment-name", environment, "--terminate-resources"],
        )
        .await
    }

    async fn describe_environments(
        &self,
        query: &EnvironmentQuery<'_>,
    ) -> Result<Vec<EnvironmentDescription>> {
        let mut args = vec!["--application-name", query.application];
        if let Some(names) = query.names {
            args.push("--environment-names");
            args.extend(names.iter().map(String::as_str));
        }
        args.push(if query.include_deleted {
            "--include-deleted"
        } else {
            "--no-include-deleted"
        });
        let envelope: EnvironmentsEnvelope = self
            .query("elasticbeanstalk", "describe-environments", &args)
            .await?;
        Ok(envelope.environments)
    }

    async fn validate_configuration_settings(
        &self,
        application: &str,
        environment: &str,
        option_settings: &[OptionSetting],
    ) -> Result<Vec<ValidationMessage>> {
        let settings = option_settings_json(option_settings)?;
        let envelope: ValidationEnvelope = self
            .query(
                "elasticbeanstalk",
                "validate-configuration-settings",
                &[
                    "--application-name",
                    application,
                    "--environment-name",
                    environment,
                    "--option-settings",
                    &settings,
                ],
            )
            .await?;
        Ok(envelope.messages)
    }
}

impl<R: CommandRunner> VersionApi for AwsCli<R> {
    async fn create_application_version(&self, version: &NewVersion<'_>) -> Result<()> {
        let bundle = format!("S3Bucket={},S3Key={}", version.bucket, version.key);
        self.beanstalk(
            "create-application-version",
            &[
                "--application-name",
                version.application,
                "--version-label",
                version.version_label,
                "--source-bundle",
                &bundle,
            ],
        )
        .await
    }

    async fn describe_application_versions(
        &self,
        application: &str,
    ) -> Result<Vec<ApplicationVersion>> {
        let envelope: VersionsEnvelope = self
            .query(
                "elasticbeanstalk",
                "describe-application-versions",
                &["--application-name", application],
            )
            .await?;
        Ok(envelope.application_versions)
    }

    async fn delete_application_version(
        &self,
        application: &str,
        version_label: &str,
    ) -> Result<()> {
        self.beanstalk(
            "delete-application-version",
            &[
                "--application-name",
                application,
                "--version-label",
                version_label,
            ],
        )
        .await
    }
}

// ── Storage port ──────────────────────────────────────────────────────────────

impl<R: CommandRunner> ObjectStore for AwsCli<R> {
    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>> {
        let output = self
            .runner
            .run(
                AWS,
                &["s3api", "get-bucket-location", "--bucket", bucket, "--output", "json"],
            )
            .await
            .context("aws s3api get-bucket-location")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_missing_bucket(&stderr) {
                return Ok(None);
            }
            check(&output, "s3api", "get-bucket-location")?;
        }
        let location: BucketLocation = serde_json::from_slice(&output.stdout)
            .context("parsing output of aws s3api get-bucket-location")?;
        Ok(Some(normalize_region(location.location_constraint)))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let constraint = format!("LocationConstraint={region}");
        let mut args = vec!["--bucket", bucket, "--region", region];
        if region != DEFAULT_BUCKET_REGION {
            args.extend(["--create-bucket-configuration", constraint.as_str()]);
        }
        self.call("s3api", "create-bucket", &args).await.map(drop)
    }

    async fn put_object(
        &self,
        upload: &ObjectUpload<'_>,
        progress: &dyn Fn(u64, u64),
    ) -> Result<()> {
        let target = format!("s3://{}/{}", upload.bucket, upload.key);
        let total = tokio::fs::metadata(upload.path)
            .await
            .with_context(|| format!("cannot stat {}", upload.path.display()))?
            .len();
        let metadata = metadata_arg(upload.metadata);
        let expected = total.to_string();
        let args = [
            "s3",
            "cp",
            "-",
            target.as_str(),
            "--metadata",
            metadata.as_str(),
            "--expected-size",
            expected.as_str(),
            "--only-show-errors",
        ];
        let child = self.runner.spawn(AWS, &args)?;
        tokio::time::timeout(
            UPLOAD_TIMEOUT,
            stream_upload(child, upload.path, total, progress),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "upload to {target} timed out after {}s",
                UPLOAD_TIMEOUT.as_secs()
            )
        })?
        .with_context(|| format!("aws s3 cp to {target}"))
    }
}

/// Pipes `path` into the child's stdin, then reaps it.
///
/// A failed write usually means the client exited early; its exit status and
/// stderr take precedence over the broken pipe.
async fn stream_upload(
    mut child: tokio::process::Child,
    path: &Path,
    total: u64,
    progress: &dyn Fn(u64, u64),
) -> Result<()> {
    let mut stdin = child.stdin.take().context("child stdin not piped")?;
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut gate = ProgressGate::new(total);
    if total == 0 {
        progress(0, 0);
    }
    let mut buf = vec![0u8; UPLOAD_CHUNK];
    let mut sent = 0u64;
    let mut write_error = None;
    loop {
        let n = file
            .read(&mut buf)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        if let Err(e) = stdin.write_all(&buf[..n]).await {
            write_error = Some(e);
            break;
        }
        sent += n as u64;
        if gate.advance(sent) {
            progress(sent, total);
        }
    }
    if write_error.is_none() {
        write_error = stdin.shutdown().await.err();
    }
    drop(stdin);

    let output = child
        .wait_with_output()
        .await
        .context("waiting for aws s3 cp")?;
    check(&output, "s3", "cp")?;
    match write_error {
        Some(e) => Err(e).context("writing to aws s3 cp"),
        None => Ok(()),
    }
}

/// Lets a progress report through each time another 10% has been sent.
#[derive(Debug, Clone, Copy)]
pub struct ProgressGate {
    total: u64,
    next_decile: u64,
}

impl ProgressGate {
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            next_decile: 1,
        }
    }

    /// Returns `true` if `sent` crossed a boundary not yet reported.
    pub fn advance(&mut self, sent: u64) -> bool {
        if self.total == 0 || self.next_decile > 10 {
            return false;
        }
        let decile = sent.min(self.total) * 10 / self.total;
        if decile >= self.next_decile {
            self.next_decile = decile + 1;
            true
        } else {
            false
        }
    }
}
