// src/mirror/path_map.rs

//! Source → target path translation.

use std::path::{Path, PathBuf};

use crate::errors::{Result, SyncError};
use crate::types::FileCategory;

/// Maps paths under `source_root` onto `target_root` by prefix substitution.
///
/// `TemplateVar` files are the one exception: their target gets the
/// document extension (`page.json` → `page.md`), since the written artifact
/// is the rendered page rather than the JSON input.
#[derive(Debug, Clone)]
pub struct PathMapper {
    source_root: PathBuf,
    target_root: PathBuf,
    document_extension: String,
}

impl PathMapper {
    pub fn new(
        source_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
        document_extension: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
            document_extension: document_extension.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn document_extension(&self) -> &str {
        &self.document_extension
    }

    /// Path of `source` relative to the source root.
    pub fn relative<'a>(&self, source: &'a Path) -> Result<&'a Path> {
        source
            .strip_prefix(&self.source_root)
            .map_err(|_| SyncError::OutsideRoot {
                path: source.to_path_buf(),
                root: self.source_root.clone(),
            })
    }

    /// Target location of a source file.
    pub fn target_of(&self, source: &Path) -> Result<PathBuf> {
        let target = self.target_dir_of(source)?;
        match FileCategory::classify(source) {
            FileCategory::TemplateVar => Ok(target.with_extension(&self.document_extension)),
            _ => Ok(target),
        }
    }

    /// Target location of a source directory (no extension rewrite).
    pub fn target_dir_of(&self, source: &Path) -> Result<PathBuf> {
        let rel = self.relative(source)?;
        if rel.as_os_str().is_empty() {
            return Ok(self.target_root.clone());
        }
        Ok(self.target_root.join(rel))
    }
}
