//! Version retention planning.

use std::collections::HashSet;

use ebdeploy_common::ApplicationVersion;

/// Default number of most recent versions kept by cleanup.
pub const DEFAULT_VERSIONS_TO_KEEP: usize = 10;

/// Which versions a cleanup run deletes and which it spares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Labels to delete, newest first.
    pub delete: Vec<String>,
    /// Labels beyond the cutoff that are still referenced by an environment.
    pub in_use: Vec<String>,
}

/// Pick the versions to delete.
///
/// Versions are ranked by creation time, newest first. The first `keep` are
/// always retained; of the rest, any label in `in_use` is retained too.
#[must_use]
pub fn plan(
    versions: &[ApplicationVersion],
    in_use: &HashSet<String>,
    keep: usize,
) -> RetentionPlan {
    let mut ranked: Vec<&ApplicationVersion> = versions.iter().collect();
    ranked.sort_by(|a, b| b.date_created.cmp(&a.date_created));

    let mut plan = RetentionPlan::default();
    for version in ranked.into_iter().skip(keep) {
        if in_use.contains(&version.version_label) {
            plan.in_use.push(version.version_label.clone());
        } else {
            plan.delete.push(version.version_label.clone());
        }
    }
    plan
}
