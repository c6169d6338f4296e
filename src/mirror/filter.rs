// src/mirror/filter.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{Result, SyncError};

/// Compiled exclusion lists.
///
/// A path is filtered when its leaf name matches one of `exclude_names`
/// (glob patterns such as `_*.md`) or when any of its segments equals one of
/// `exclude_dirs`. Paths are expected relative to the source root so that
/// the root's own location never causes a match.
#[derive(Clone)]
pub struct Filter {
    name_set: GlobSet,
    dir_names: HashSet<String>,
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("dir_names", &self.dir_names)
            .finish_non_exhaustive()
    }
}

impl Filter {
    pub fn new(exclude_names: &[String], exclude_dirs: &[String]) -> Result<Self> {
        let name_set = build_globset(exclude_names)
            .map_err(|e| SyncError::ConfigError(format!("{e:#}")))?;

        Ok(Self {
            name_set,
            dir_names: exclude_dirs.iter().cloned().collect(),
        })
    }

    /// A filter that lets everything through.
    pub fn allow_all() -> Self {
        Self {
            name_set: GlobSet::empty(),
            dir_names: HashSet::new(),
        }
    }

    pub fn is_filtered(&self, path: &Path) -> bool {
        let leaf_excluded = path
            .file_name()
            .map(|name| self.name_set.is_match(Path::new(name)))
            .unwrap_or(false);

        leaf_excluded || self.has_excluded_segment(path)
    }

    /// True if every file below `dir` is filtered, so a walk can skip it.
    pub fn excludes_dir(&self, dir: &Path) -> bool {
        self.has_excluded_segment(dir)
    }

    fn has_excluded_segment(&self, path: &Path) -> bool {
        if self.dir_names.is_empty() {
            return false;
        }
        path.components().any(|c| match c {
            Component::Normal(seg) => seg
                .to_str()
                .map(|s| self.dir_names.contains(s))
                .unwrap_or(false),
            _ => false,
        })
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid exclude_names pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
