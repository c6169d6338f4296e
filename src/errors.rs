// src/errors.rs

//! Crate-wide error type.
//!
//! File-level failures (`SourceRead`, `TargetWrite`, `Render`, `Rule`) abort
//! processing of one file only; the session that hit them keeps running.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SessionId;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Path {path:?} is not under source root {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to read source {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write target {path:?}: {source}")]
    TargetWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to render {path:?}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("Rule '{mark}' failed on {path:?}: {source}")]
    Rule {
        mark: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Watch session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// True for failures scoped to a single file.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            SyncError::SourceRead { .. }
                | SyncError::TargetWrite { .. }
                | SyncError::Render { .. }
                | SyncError::Rule { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SyncError>;
