//! Domain types and validators for the deployment config file.
//!
//! Pure functions only — no I/O, no async, no filesystem access. Environment
//! variable fallbacks are resolved through an injected lookup function.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use ebdeploy_common::OptionSetting;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::archive::{
    ArchiveRules, DEFAULT_EXCLUDED_SUFFIXES, EntryContent, SyntheticEntry,
};
use crate::domain::error::{ConfigError, DeployError};
use crate::domain::retention::DEFAULT_VERSIONS_TO_KEEP;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `ebs.config`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeployConfig {
    /// Credentials and storage target.
    pub aws: AwsSection,
    /// Application, archive, and environment definitions.
    pub app: AppSection,
}

/// The `aws:` section. Empty credential fields fall back to the standard
/// `AWS_*` environment variables.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AwsSection {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub bucket_path: Option<String>,
}

impl fmt::Debug for AwsSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSection")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("bucket_path", &self.bucket_path)
            .finish()
    }
}

/// The `app:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub app_name: String,
    pub description: Option<String>,
    pub versions_to_keep: usize,
    pub archive: ArchiveSection,
    /// Environment name → definition. Ordered so runs are reproducible.
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            description: None,
            versions_to_keep: DEFAULT_VERSIONS_TO_KEEP,
            archive: ArchiveSection::default(),
            environments: BTreeMap::new(),
        }
    }
}

/// How the source bundle is assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSection {
    /// Source directory, relative to the working directory.
    pub directory: PathBuf,
    /// Regular expressions matched against archive-relative paths.
    pub excludes: Vec<String>,
    /// Path suffixes that are never archived.
    pub exclude_suffixes: Vec<String>,
    /// Extra entries written into the archive.
    pub files: Vec<ArchiveFile>,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            excludes: Vec::new(),
            exclude_suffixes: DEFAULT_EXCLUDED_SUFFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            files: Vec::new(),
        }
    }
}

/// A synthetic archive entry: exactly one of `yaml` or `content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Definition of one environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub cname_prefix: Option<String>,
    pub solution_stack_name: Option<String>,
    pub description: Option<String>,
    /// `namespace → option → value`.
    pub option_settings: BTreeMap<String, BTreeMap<String, serde_yaml::Value>>,
}

impl EnvironmentConfig {
    /// Flatten the nested option map into platform option settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is not a scalar.
    pub fn option_settings(&self) -> Result<Vec<OptionSetting>> {
        let mut settings = Vec::new();
        for (namespace, options) in &self.option_settings {
            for (option, value) in options {
                settings.push(OptionSetting {
                    namespace: namespace.clone(),
                    option_name: option.clone(),
                    value: scalar_to_string(value).ok_or_else(|| ConfigError::InvalidOption {
                        namespace: namespace.clone(),
                        option: option.clone(),
                        reason: "value must be a string, number, or boolean".to_string(),
                    })?,
                });
            }
        }
        Ok(settings)
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ── Derived values ───────────────────────────────────────────────────────────

impl DeployConfig {
    /// Look up the environments a run should touch.
    ///
    /// An empty `selected` list means every configured environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected name is not defined in the config.
    pub fn environments<'a>(
        &'a self,
        selected: &[String],
    ) -> Result<Vec<(&'a str, &'a EnvironmentConfig)>> {
        if selected.is_empty() {
            return Ok(self
                .app
                .environments
                .iter()
                .map(|(name, cfg)| (name.as_str(), cfg))
                .collect());
        }
        selected
            .iter()
            .map(|name| {
                self.app
                    .environments
                    .get_key_value(name)
                    .map(|(k, v)| (k.as_str(), v))
                    .ok_or_else(|| {
                        anyhow::Error::from(DeployError::UnknownEnvironment(name.clone()))
                    })
            })
            .collect()
    }

    /// Build the archive inclusion rules.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern is not a valid regex.
    pub fn archive_rules(&self) -> Result<ArchiveRules> {
        let patterns = self
            .app
            .archive
            .excludes
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArchiveRules::new(
            self.app.archive.exclude_suffixes.clone(),
            patterns,
        ))
    }

    /// Build the synthetic entries injected into the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry has both or neither of `yaml`/`content`.
    pub fn archive_entries(&self) -> Result<Vec<SyntheticEntry>> {
        self.app
            .archive
            .files
            .iter()
            .map(|file| -> Result<SyntheticEntry> {
                let content = match (&file.yaml, &file.content) {
                    (Some(doc), None) => EntryContent::Yaml(doc.clone()),
                    (None, Some(text)) => EntryContent::Raw(text.clone()),
                    (Some(_), Some(_)) => {
                        return Err(ConfigError::InvalidEntry {
                            name: file.name.clone(),
                            reason: "set either 'yaml' or 'content', not both".to_string(),
                        }
                        .into());
                    }
                    (None, None) => {
                        return Err(ConfigError::InvalidEntry {
                            name: file.name.clone(),
                            reason: "one of 'yaml' or 'content' is required".to_string(),
                        }
                        .into());
                    }
                };
                Ok(SyntheticEntry {
                    name: file.name.clone(),
                    content,
                })
            })
            .collect()
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// Resolved credentials and storage target, fixed for the whole run.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    access_key: String,
    secret_key: String,
    region: String,
    bucket: String,
    bucket_path: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("bucket_path", &self.bucket_path)
            .finish()
    }
}

impl AwsCredentials {
    /// Build the value object. A non-empty `bucket_path` always ends with `/`.
    #[must_use]
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
        bucket_path: impl Into<String>,
    ) -> Self {
        let mut bucket_path = bucket_path.into();
        if !bucket_path.is_empty() && !bucket_path.ends_with('/') {
            bucket_path.push('/');
        }
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            bucket: bucket.into(),
            bucket_path,
        }
    }

    /// Resolve credentials from the `aws:` section, falling back to
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, and `AWS_DEFAULT_REGION`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is missing from both sources.
    pub fn resolve(section: &AwsSection, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pick = |value: &Option<String>, var: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };
        let access_key = pick(&section.access_key, "AWS_ACCESS_KEY_ID")
            .ok_or(ConfigError::MissingField("aws.access_key"))?;
        let secret_key = pick(&section.secret_key, "AWS_SECRET_ACCESS_KEY")
            .ok_or(ConfigError::MissingField("aws.secret_key"))?;
        let region = pick(&section.region, "AWS_DEFAULT_REGION")
            .ok_or(ConfigError::MissingField("aws.region"))?;
        let bucket = section
            .bucket
            .clone()
            .filter(|b| !b.is_empty())
            .ok_or(ConfigError::MissingField("aws.bucket"))?;
        Ok(Self::new(
            access_key,
            secret_key,
            region,
            bucket,
            section.bucket_path.clone().unwrap_or_default(),
        ))
    }

    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn bucket_path(&self) -> &str {
        &self.bucket_path
    }

    /// Full object key for an archive uploaded as `key`.
    #[must_use]
    pub fn object_key(&self, key: &str) -> String {
        format!("{}{key}", self.bucket_path)
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates the parts of the config every command relies on.
///
/// # Errors
///
/// Returns an error if the application name is missing, an exclude pattern
/// does not compile, or an archive entry or option value is malformed.
pub fn validate_config(config: &DeployConfig) -> Result<()> {
    if config.app.app_name.trim().is_empty() {
        return Err(ConfigError::MissingField("app.app_name").into());
    }
    config.archive_rules()?;
    config.archive_entries()?;
    for env in config.app.environments.values() {
        env.option_settings()?;
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
