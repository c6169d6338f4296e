// src/mirror/skeleton.rs

//! Directory-level operations on the target tree.
//!
//! Both walks use an explicit work stack, so deep trees cannot overflow the
//! call stack. Neither descends into symlinked directories: a link back to an
//! ancestor would otherwise be walked until the OS gives up, and a link in
//! the target could lead removal outside the target root.

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::errors::{Result, SyncError};
use crate::fs::FileSystem;

use super::filter::Filter;
use super::path_map::PathMapper;

/// Create the target directory for every non-filtered directory under
/// `source_dir` (inclusive). Existing directories are left alone.
///
/// Returns the number of directories created.
pub fn ensure_skeleton(
    fs: &dyn FileSystem,
    mapper: &PathMapper,
    filter: &Filter,
    source_dir: &Path,
) -> Result<usize> {
    let mut created = 0;
    let mut stack = vec![source_dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let rel = mapper.relative(&dir)?;
        if filter.is_filtered(rel) {
            debug!(dir = ?dir, "skipping filtered directory subtree");
            continue;
        }

        let target = mapper.target_dir_of(&dir)?;
        if !fs.is_dir(&target) {
            fs.create_dir_all(&target)
                .map_err(|e| SyncError::TargetWrite {
                    path: target.clone(),
                    source: e,
                })?;
            created += 1;
        }

        let children = fs.read_dir(&dir).map_err(|e| SyncError::SourceRead {
            path: dir.clone(),
            source: e,
        })?;
        for child in children {
            if fs.is_dir(&child) && !fs.is_symlink(&child) {
                stack.push(child);
            }
        }
    }

    Ok(created)
}

/// Delete `target` and everything below it. A missing target is not an
/// error.
///
/// Returns the number of entries (files and directories) removed.
pub fn remove_tree(fs: &dyn FileSystem, target: &Path) -> Result<usize> {
    // Only the link goes, never what it points at.
    if fs.is_symlink(target) {
        fs.remove_file(target).map_err(|e| write_error(target, e))?;
        return Ok(1);
    }
    if !fs.exists(target) {
        return Ok(0);
    }
    if fs.is_file(target) {
        fs.remove_file(target).map_err(|e| write_error(target, e))?;
        return Ok(1);
    }

    // First pass: collect directories parent-before-child, deleting files
    // along the way. Second pass: remove directories deepest first.
    let mut removed = 0;
    let mut dirs = Vec::new();
    let mut stack = vec![target.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let children = fs
            .read_dir(&dir)
            .with_context(|| format!("listing {:?} for removal", dir))
            .map_err(|e| write_error(&dir, e))?;
        for child in children {
            if fs.is_dir(&child) && !fs.is_symlink(&child) {
                stack.push(child);
            } else {
                fs.remove_file(&child).map_err(|e| write_error(&child, e))?;
                removed += 1;
            }
        }
        dirs.push(dir);
    }

    for dir in dirs.iter().rev() {
        fs.remove_dir(dir).map_err(|e| write_error(dir, e))?;
        removed += 1;
    }

    Ok(removed)
}

fn write_error(path: &Path, source: anyhow::Error) -> SyncError {
    SyncError::TargetWrite {
        path: path.to_path_buf(),
        source,
    }
}
