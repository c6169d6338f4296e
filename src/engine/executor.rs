// src/engine/executor.rs

//! IO shell that performs [`MirrorAction`]s.

use std::io::Read;
use std::path::Path;
use std::sync::{Arc, PoisonError};

use blake3::Hasher;
use tracing::{debug, info};

use crate::convert::{ConverterSet, FileConverter};
use crate::errors::{Result, SyncError};
use crate::fs::FileSystem;
use crate::mirror::pipeline::SharedPipeline;
use crate::mirror::{ensure_skeleton, remove_tree, Filter, PathMapper};
use crate::types::FileCategory;

use super::{ActionOutcome, MirrorAction};

/// Performs mirror actions against a [`FileSystem`].
///
/// Cheap to clone; every session of a registry shares the same converters
/// and rule pipeline.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    fs: Arc<dyn FileSystem>,
    mapper: PathMapper,
    filter: Filter,
    converters: ConverterSet,
    pipeline: SharedPipeline,
    skip_unchanged: bool,
}

impl ActionExecutor {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        mapper: PathMapper,
        filter: Filter,
        converters: ConverterSet,
        pipeline: SharedPipeline,
        skip_unchanged: bool,
    ) -> Self {
        Self {
            fs,
            mapper,
            filter,
            converters,
            pipeline,
            skip_unchanged,
        }
    }

    pub fn execute(&self, action: &MirrorAction) -> Result<ActionOutcome> {
        match action {
            MirrorAction::Render {
                source,
                target,
                category,
            } => {
                let content = self.render(source, *category)?;
                self.persist(target, content.as_bytes())
            }
            MirrorAction::Copy { source, target } => {
                let bytes = self.fs.read(source).map_err(|e| SyncError::SourceRead {
                    path: source.clone(),
                    source: e,
                })?;
                self.persist(target, &bytes)
            }
            MirrorAction::RemoveFile { target, .. } => self.remove_file(target),
            MirrorAction::RemoveTree { target, .. } => {
                let entries = remove_tree(self.fs.as_ref(), target)?;
                if entries == 0 {
                    return Ok(ActionOutcome::Absent(target.clone()));
                }
                info!(target = ?target, entries, "target directory removed");
                Ok(ActionOutcome::Removed {
                    target: target.clone(),
                    entries,
                })
            }
            MirrorAction::BuildSkeleton { root } => {
                let created = ensure_skeleton(self.fs.as_ref(), &self.mapper, &self.filter, root)?;
                debug!(root = ?root, created, "target skeleton ensured");
                Ok(ActionOutcome::SkeletonBuilt { created })
            }
            MirrorAction::InitialSyncComplete => {
                info!("documents go-over done");
                Ok(ActionOutcome::InitialSyncComplete)
            }
        }
    }

    /// Convert `source` with the converter for `category` and run the rule
    /// pipeline over the result. Nothing is written.
    pub fn render(&self, source: &Path, category: FileCategory) -> Result<String> {
        match self.converters.for_category(category) {
            Some(converter) => self.render_with(converter.as_ref(), source),
            None => {
                let text = self.fs.read_to_string(source).map_err(|e| SyncError::SourceRead {
                    path: source.to_path_buf(),
                    source: e,
                })?;
                Ok(text)
            }
        }
    }

    /// Run a specific converter plus the rule pipeline.
    pub fn render_with(&self, converter: &dyn FileConverter, source: &Path) -> Result<String> {
        let content = converter.convert(source)?;
        let pipeline = self.pipeline.read().unwrap_or_else(PoisonError::into_inner);
        pipeline.apply(source, content)
    }

    pub fn converters(&self) -> &ConverterSet {
        &self.converters
    }

    fn persist(&self, target: &Path, contents: &[u8]) -> Result<ActionOutcome> {
        if self.skip_unchanged && self.same_content(target, contents) {
            debug!(target = ?target, "target content unchanged; skipping write");
            return Ok(ActionOutcome::Unchanged(target.to_path_buf()));
        }

        self.fs
            .write(target, contents)
            .map_err(|e| SyncError::TargetWrite {
                path: target.to_path_buf(),
                source: e,
            })?;
        info!(target = ?target, "target file updated");
        Ok(ActionOutcome::Written(target.to_path_buf()))
    }

    fn remove_file(&self, target: &Path) -> Result<ActionOutcome> {
        if !self.fs.exists(target) && !self.fs.is_symlink(target) {
            debug!(target = ?target, "target already absent");
            return Ok(ActionOutcome::Absent(target.to_path_buf()));
        }

        // The notifier could not tell us the removed entry was a directory.
        if self.fs.is_dir(target) {
            let entries = remove_tree(self.fs.as_ref(), target)?;
            return Ok(ActionOutcome::Removed {
                target: target.to_path_buf(),
                entries,
            });
        }

        self.fs
            .remove_file(target)
            .map_err(|e| SyncError::TargetWrite {
                path: target.to_path_buf(),
                source: e,
            })?;
        info!(target = ?target, "target file removed");
        Ok(ActionOutcome::Removed {
            target: target.to_path_buf(),
            entries: 1,
        })
    }

    fn same_content(&self, target: &Path, contents: &[u8]) -> bool {
        if !self.fs.is_file(target) {
            return false;
        }
        match digest_file(self.fs.as_ref(), target) {
            Ok(existing) => existing == blake3::hash(contents),
            Err(err) => {
                debug!(target = ?target, error = %err, "could not hash existing target");
                false
            }
        }
    }
}

fn digest_file(fs: &dyn FileSystem, path: &Path) -> anyhow::Result<blake3::Hash> {
    let mut hasher = Hasher::new();
    let mut reader = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
