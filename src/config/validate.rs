// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::model::{MirrorConfig, RawConfigFile};
use crate::errors::{Result, SyncError};
use crate::fs::FileSystem;
use crate::mirror::Filter;

impl MirrorConfig {
    /// Resolve every path in `raw` against `base_dir`.
    ///
    /// Existing roots are canonicalized so that event paths reported by the
    /// OS (which may go through symlinks) still share their prefix.
    pub fn from_raw(raw: RawConfigFile, base_dir: &Path) -> Result<Self> {
        let source_root = canonical_or_joined(base_dir, &raw.paths.source);
        let target_root = canonical_or_joined(base_dir, &raw.paths.target);

        let template_dir = source_root.join(&raw.render.template_dir);
        let variables = raw.render.variables.as_ref().map(|v| source_root.join(v));

        Ok(Self {
            source_root,
            target_root,
            exclude_names: raw.filter.exclude_names,
            exclude_dirs: raw.filter.exclude_dirs,
            template_dir,
            variables,
            document_extension: raw.render.document_extension,
            default_rules: raw.render.default_rules,
            skip_unchanged: raw.render.skip_unchanged,
            expand_documents: raw.render.expand_documents,
        })
    }
}

fn canonical_or_joined(base_dir: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}

/// Check a resolved configuration.
///
/// This checks:
/// - the source root exists and is a directory
/// - the target root is neither the source root nor inside it
/// - every `exclude_names` pattern compiles
/// - `document_extension` is a bare extension
pub fn validate_config(cfg: &MirrorConfig, fs: &dyn FileSystem) -> Result<()> {
    validate_roots(cfg, fs)?;
    validate_patterns(cfg)?;
    validate_document_extension(cfg)?;
    Ok(())
}

fn validate_roots(cfg: &MirrorConfig, fs: &dyn FileSystem) -> Result<()> {
    if !fs.is_dir(&cfg.source_root) {
        return Err(SyncError::ConfigError(format!(
            "source root {:?} does not exist or is not a directory",
            cfg.source_root
        )));
    }

    if cfg.target_root.starts_with(&cfg.source_root) {
        return Err(SyncError::ConfigError(format!(
            "target root {:?} must not be inside source root {:?}",
            cfg.target_root, cfg.source_root
        )));
    }

    Ok(())
}

fn validate_patterns(cfg: &MirrorConfig) -> Result<()> {
    Filter::new(&cfg.exclude_names, &cfg.exclude_dirs).map(|_| ())
}

fn validate_document_extension(cfg: &MirrorConfig) -> Result<()> {
    let ext = cfg.document_extension.as_str();
    if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
        return Err(SyncError::ConfigError(format!(
            "[render].document_extension must be a bare extension like \"md\" (got {ext:?})"
        )));
    }
    Ok(())
}
