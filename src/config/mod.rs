// src/config/mod.rs

//! Configuration loading and validation for docmirror.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Resolve and validate roots and patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, load_and_validate, load_from_path};
pub use model::{
    FilterSection, MirrorConfig, PathsSection, RawConfigFile, RenderSection, DEFAULT_CONFIG_FILE,
};
pub use validate::validate_config;
