// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{MirrorConfig, RawConfigFile};
use crate::config::validate::validate_config;
use crate::errors::Result;
use crate::fs::RealFileSystem;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** resolve or
/// validate the roots. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, resolve relative paths against the
/// file's directory and validate the result.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<MirrorConfig> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let config = MirrorConfig::from_raw(raw, &config_root_dir(path))?;
    validate_config(&config, &RealFileSystem)?;
    Ok(config)
}

/// Directory that relative paths in the config resolve against.
///
/// - If the config path has a non-empty parent (e.g. "site/Docmirror.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Docmirror.toml" (parent = ""),
///   we fall back to the current working directory "."
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
