//! Convergence targets and the watch set used while polling environments.
//!
//! Pure types only — the polling loop itself lives in
//! `application::services::convergence`.

use std::collections::BTreeSet;
use std::time::Duration;

use ebdeploy_common::{EnvironmentDescription, EnvironmentHealth, EnvironmentStatus};

/// Fixed delay between two describe-calls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound for a single wait session.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Desired environment state. A `None` field is not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetCriteria {
    pub health: Option<EnvironmentHealth>,
    pub status: Option<EnvironmentStatus>,
    pub version_label: Option<String>,
}

impl TargetCriteria {
    /// Target reached once a deployment of `version_label` has finished.
    #[must_use]
    pub fn deployed(version_label: &str) -> Self {
        Self {
            health: None,
            status: Some(EnvironmentStatus::Ready),
            version_label: Some(version_label.to_string()),
        }
    }

    /// Target reached once the environment settles in `status`.
    #[must_use]
    pub fn status(status: EnvironmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_health(mut self, health: Option<EnvironmentHealth>) -> Self {
        if health.is_some() {
            self.health = health;
        }
        self
    }

    /// Returns `true` when every specified field matches the observation.
    #[must_use]
    pub fn is_satisfied_by(&self, env: &EnvironmentDescription) -> bool {
        let health_ok = self.health.is_none_or(|h| env.health == h);
        let status_ok = self.status.is_none_or(|s| env.status == s);
        let version_ok = self
            .version_label
            .as_deref()
            .is_none_or(|v| env.version_label.as_deref() == Some(v));
        health_ok && status_ok && version_ok
    }

    /// One-line summary of what a wait session is waiting for.
    #[must_use]
    pub fn intent(&self, watch: &WatchSet) -> String {
        let mut line = format!("waiting for environment(s) {} to", watch.joined(", "));
        match self.health {
            Some(h) => line.push_str(&format!(" have health {h}")),
            None => line.push_str(" have any health"),
        }
        if let Some(v) = &self.version_label {
            line.push_str(&format!(" and have version {v}"));
        }
        if let Some(s) = self.status {
            line.push_str(&format!(" and have status {s}"));
        }
        line
    }

    /// Observed state of one environment, phrased against this target.
    #[must_use]
    pub fn observation(&self, env: &EnvironmentDescription) -> String {
        let mut line = format!("environment {} is {}", env.environment_name, env.health);
        if self.version_label.is_some() {
            let observed = env.version_label.as_deref().unwrap_or("<none>");
            line.push_str(&format!(" and has version {observed}"));
        }
        if self.status.is_some() {
            line.push_str(&format!(" and has status {}", env.status));
        }
        line
    }
}

/// Environment names still awaiting convergence.
///
/// Names can only be removed once the set is built, so a session's watch set
/// never grows back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    names: BTreeSet<String>,
}

impl WatchSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Drop `name` from the set. Returns `false` if it was not being watched.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Snapshot of the watched names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    #[must_use]
    pub fn into_names(self) -> Vec<String> {
        self.names.into_iter().collect()
    }

    fn joined(&self, sep: &str) -> String {
        self.names.iter().map(String::as_str).collect::<Vec<_>>().join(sep)
    }
}

impl From<&str> for WatchSet {
    fn from(name: &str) -> Self {
        std::iter::once(name.to_string()).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for WatchSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Tuning knobs for one wait session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    /// Also return terminated environments from describe-calls.
    pub include_deleted: bool,
}

impl WaitOptions {
    #[must_use]
    pub fn with_max_wait(max_wait: Duration) -> Self {
        Self {
            max_wait,
            ..Self::default()
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
            include_deleted: true,
        }
    }
}
