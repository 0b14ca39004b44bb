//! In-memory implementations of the platform and storage ports.
//!
//! `MemoryPlatform` models environment lifecycles: a mutated environment
//! stays in its transitional status for `lag` describe-calls, then settles.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use ebdeploy_cli::application::ports::{
    ApplicationApi, CreateEnvironment, EnvironmentApi, EnvironmentQuery, NewVersion, ObjectStore,
    ObjectUpload, UpdateEnvironment, VersionApi,
};
use ebdeploy_common::{
    ApplicationDescription, ApplicationVersion, EnvironmentDescription, EnvironmentHealth,
    EnvironmentStatus, OptionSetting, SourceBundle, ValidationMessage,
};

use crate::helpers::{APP, environment};

#[derive(Default)]
pub struct MemoryPlatform {
    pub applications: RefCell<Vec<String>>,
    pub environments: RefCell<Vec<EnvironmentDescription>>,
    pub versions: RefCell<Vec<ApplicationVersion>>,
    pub validation: RefCell<Vec<ValidationMessage>>,
    /// Describe-calls an environment spends in a transitional status.
    pub lag: Cell<u32>,
    /// Environments that never leave their transitional status.
    pub stuck: RefCell<Vec<String>>,
    pending: RefCell<HashMap<String, u32>>,
    pub log: RefCell<Vec<String>>,
    pub describes: Cell<usize>,
}

impl MemoryPlatform {
    pub fn with_application(self) -> Self {
        self.applications.borrow_mut().push(APP.to_string());
        self
    }

    pub fn with_environment(self, env: EnvironmentDescription) -> Self {
        self.environments.borrow_mut().push(env);
        self
    }

    pub fn with_versions(self, versions: Vec<ApplicationVersion>) -> Self {
        self.versions.borrow_mut().extend(versions);
        self
    }

    pub fn with_lag(self, lag: u32) -> Self {
        self.lag.set(lag);
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn version_labels(&self) -> Vec<String> {
        self.versions
            .borrow()
            .iter()
            .map(|v| v.version_label.clone())
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<EnvironmentDescription> {
        self.environments
            .borrow()
            .iter()
            .find(|e| e.environment_name == name)
            .cloned()
    }

    fn transition(&self, name: &str, status: EnvironmentStatus, version: Option<&str>) {
        let mut envs = self.environments.borrow_mut();
        if let Some(env) = envs.iter_mut().find(|e| e.environment_name == name) {
            env.status = status;
            env.health = EnvironmentHealth::Grey;
            if let Some(label) = version {
                env.version_label = Some(label.to_string());
            }
        }
        self.pending
            .borrow_mut()
            .insert(name.to_string(), self.lag.get());
    }

    fn settle(&self) {
        let mut pending = self.pending.borrow_mut();
        let stuck = self.stuck.borrow();
        let mut envs = self.environments.borrow_mut();
        for env in envs.iter_mut() {
            let name = &env.environment_name;
            if stuck.contains(name) {
                continue;
            }
            let Some(remaining) = pending.get_mut(name) else {
                continue;
            };
            if *remaining > 0 {
                *remaining -= 1;
                continue;
            }
            pending.remove(name);
            match env.status {
                EnvironmentStatus::Launching | EnvironmentStatus::Updating => {
                    env.status = EnvironmentStatus::Ready;
                    env.health = EnvironmentHealth::Green;
                }
                EnvironmentStatus::Terminating => {
                    env.status = EnvironmentStatus::Terminated;
                }
                _ => {}
            }
        }
    }
}

impl ApplicationApi for MemoryPlatform {
    async fn create_application(&self, name: &str, _: Option<&str>) -> Result<()> {
        self.log.borrow_mut().push(format!("create_application {name}"));
        self.applications.borrow_mut().push(name.to_string());
        Ok(())
    }

    async fn delete_application(&self, name: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("delete_application {name}"));
        self.applications.borrow_mut().retain(|a| a != name);
        for env in self.environments.borrow_mut().iter_mut() {
            env.status = EnvironmentStatus::Terminated;
        }
        Ok(())
    }

    async fn describe_applications(&self, names: &[String]) -> Result<Vec<ApplicationDescription>> {
        Ok(self
            .applications
            .borrow()
            .iter()
            .filter(|a| names.contains(a))
            .map(|a| ApplicationDescription {
                application_name: a.clone(),
                description: None,
                versions: self.version_labels(),
                date_created: None,
            })
            .collect())
    }

    async fn list_available_solution_stacks(&self) -> Result<Vec<String>> {
        Ok(vec!["64bit Amazon Linux 2023 v4.0.0 running Python 3.11".to_string()])
    }
}

impl EnvironmentApi for MemoryPlatform {
    async fn create_environment(&self, request: &CreateEnvironment<'_>) -> Result<()> {
        self.log.borrow_mut().push(format!(
            "create_environment {} {}",
            request.environment,
            request.version_label.unwrap_or("-")
        ));
        self.environments.borrow_mut().push(environment(
            request.environment,
            EnvironmentStatus::Launching,
            EnvironmentHealth::Grey,
            request.version_label,
        ));
        self.transition(request.environment, EnvironmentStatus::Launching, None);
        Ok(())
    }

    async fn update_environment(&self, request: &UpdateEnvironment<'_>) -> Result<()> {
        self.log.borrow_mut().push(format!(
            "update_environment {} {} settings={}",
            request.environment,
            request.version_label.unwrap_or("-"),
            request.option_settings.len()
        ));
        self.transition(
            request.environment,
            EnvironmentStatus::Updating,
            request.version_label,
        );
        Ok(())
    }

    async fn rebuild_environment(&self, environment: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("rebuild_environment {environment}"));
        self.transition(environment, EnvironmentStatus::Launching, None);
        Ok(())
    }

    async fn terminate_environment(&self, environment: &str) -> Result<()> {
        self.log
            .borrow_mut()
            .push(format!("terminate_environment {environment}"));
        self.transition(environment, EnvironmentStatus::Terminating, None);
        Ok(())
    }

    async fn describe_environments(
        &self,
        query: &EnvironmentQuery<'_>,
    ) -> Result<Vec<EnvironmentDescription>> {
        self.describes.set(self.describes.get() + 1);
        self.settle();
        Ok(self
            .environments
            .borrow()
            .iter()
            .filter(|e| query.names.is_none_or(|n| n.contains(&e.environment_name)))
            .filter(|e| query.include_deleted || e.status != EnvironmentStatus::Terminated)
            .cloned()
            .collect())
    }

    async fn validate_configuration_settings(
        &self,
        _: &str,
        environment: &str,
        _: &[OptionSetting],
    ) -> Result<Vec<ValidationMessage>> {
        self.log.borrow_mut().push(format!("validate {environment}"));
        Ok(self.validation.borrow().clone())
    }
}

impl VersionApi for MemoryPlatform {
    async fn create_application_version(&self, version: &NewVersion<'_>) -> Result<()> {
        self.log.borrow_mut().push(format!(
            "create_application_version {} {}/{}",
            version.version_label, version.bucket, version.key
        ));
        self.versions.borrow_mut().push(ApplicationVersion {
            application_name: version.application.to_string(),
            version_label: version.version_label.to_string(),
            date_created: Utc::now(),
            source_bundle: Some(SourceBundle {
                bucket: version.bucket.to_string(),
                key: version.key.to_string(),
            }),
        });
        Ok(())
    }

    async fn describe_application_versions(&self, _: &str) -> Result<Vec<ApplicationVersion>> {
        Ok(self.versions.borrow().clone())
    }

    async fn delete_application_version(&self, _: &str, version_label: &str) -> Result<()> {
        self.log
            .borrow_mut()
            .push(format!("delete_application_version {version_label}"));
        self.versions
            .borrow_mut()
            .retain(|v| v.version_label != version_label);
        Ok(())
    }
}

// ── Storage ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub metadata: Vec<(String, String)>,
}

/// Object store keeping uploads in memory. `region` is `None` until a
/// bucket is created.
#[derive(Default)]
pub struct MemoryStore {
    pub region: RefCell<Option<String>>,
    pub objects: RefCell<Vec<StoredObject>>,
    pub created: RefCell<Vec<String>>,
}

impl MemoryStore {
    pub fn in_region(region: &str) -> Self {
        Self {
            region: RefCell::new(Some(region.to_string())),
            ..Self::default()
        }
    }
}

impl ObjectStore for MemoryStore {
    async fn bucket_region(&self, _: &str) -> Result<Option<String>> {
        Ok(self.region.borrow().clone())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        self.created.borrow_mut().push(bucket.to_string());
        *self.region.borrow_mut() = Some(region.to_string());
        Ok(())
    }

    async fn put_object(
        &self,
        upload: &ObjectUpload<'_>,
        progress: &dyn Fn(u64, u64),
    ) -> Result<()> {
        let size = std::fs::metadata(upload.path)?.len();
        progress(0, size);
        progress(size, size);
        self.objects.borrow_mut().push(StoredObject {
            bucket: upload.bucket.to_string(),
            key: upload.key.to_string(),
            size,
            metadata: upload.metadata.to_vec(),
        });
        Ok(())
    }
}
