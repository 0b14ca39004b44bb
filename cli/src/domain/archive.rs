//! Archive inclusion rules and synthetic archive entries.

use std::fmt;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use regex::Regex;

/// Suffixes excluded from every archive unless the config overrides them.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[".git", ".svn"];

type PathPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Decides which files under the source root end up in the archive.
#[derive(Default)]
pub struct ArchiveRules {
    excluded_suffixes: Vec<String>,
    excluded_patterns: Vec<Regex>,
    predicate: Option<PathPredicate>,
}

impl fmt::Debug for ArchiveRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveRules")
            .field("excluded_suffixes", &self.excluded_suffixes)
            .field("excluded_patterns", &self.excluded_patterns)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl ArchiveRules {
    #[must_use]
    pub fn new(excluded_suffixes: Vec<String>, excluded_patterns: Vec<Regex>) -> Self {
        Self {
            excluded_suffixes,
            excluded_patterns,
            predicate: None,
        }
    }

    /// Add an arbitrary exclusion test over the archive-relative path.
    #[must_use]
    pub fn exclude_when(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Returns `true` if the entry at `path` (archived as `archive_name`)
    /// must be left out. Applies to directories as well as files.
    #[must_use]
    pub fn excludes(&self, path: &Path, archive_name: &str) -> bool {
        let full = path.to_string_lossy();
        if self.excluded_suffixes.iter().any(|s| full.ends_with(s.as_str())) {
            return true;
        }
        if self.excluded_patterns.iter().any(|re| re.is_match(archive_name)) {
            return true;
        }
        self.predicate.as_ref().is_some_and(|p| p(archive_name))
    }
}

/// Body of an entry written into the archive without a backing file.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryContent {
    Raw(String),
    /// Structured document, serialized as block-style YAML.
    Yaml(serde_yaml::Value),
}

/// A named entry injected into the archive after the source tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEntry {
    pub name: String,
    pub content: EntryContent,
}

impl SyntheticEntry {
    /// Text written into the archive for this entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML document cannot be serialized.
    pub fn render(&self) -> Result<String> {
        match &self.content {
            EntryContent::Raw(text) => Ok(text.clone()),
            EntryContent::Yaml(doc) => serde_yaml::to_string(doc)
                .with_context(|| format!("serializing {} as YAML", self.name)),
        }
    }
}

/// Archive-relative name of `path` under `root`, always `/`-separated.
///
/// Returns `None` for the root itself and for paths outside it.
#[must_use]
pub fn archive_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
